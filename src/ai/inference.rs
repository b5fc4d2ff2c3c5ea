use anyhow::{Context, Result};
use reqwest::Response;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = r#"You review content for potential misinformation and help readers understand why it may be misleading.
Look for loaded language, emotional manipulation, missing or unverifiable sources, logical fallacies, scam characteristics, conspiracy theories and fake urgency.
Trust score bands: 0-40 high risk, 41-70 medium risk, 71-100 low risk.
Respond with a single JSON object:
{"trust_score": <integer 0-100>, "result_summary": "<brief summary>", "educational_breakdown": [{"title": "<issue>", "explanation": "<why it matters>", "quote": "<verbatim excerpt from the content>"}]}"#;

pub fn build_request(model: String, content: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: format!("Content to analyze:\n{content}"),
            },
        ],
        temperature: 0.2,
        top_p: 1.0,
        max_tokens: 2048,
    }
}

/// Returns the first choice's message content untouched; interpretation
/// happens elsewhere.
pub async fn parse_response(response: Response) -> Result<String> {
    let completion: ChatCompletionResponse = response
        .json()
        .await
        .context("judgment response was not a chat completion")?;
    extract_content(completion)
}

fn extract_content(completion: ChatCompletionResponse) -> Result<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .context("judgment response did not contain any choices")?;

    choice
        .message
        .and_then(|msg| msg.content)
        .filter(|content| !content.trim().is_empty())
        .context("judgment response missing message content")
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_content_after_system_prompt() {
        let request = build_request("model-x".into(), "Miracle cure!");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[1].content.ends_with("Miracle cure!"));
    }

    #[test]
    fn empty_choices_are_an_error() {
        let completion: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_content(completion).is_err());
    }

    #[test]
    fn content_is_returned_verbatim() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Sure! ```json\n{}\n```"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(completion).unwrap(), "Sure! ```json\n{}\n```");
    }
}
