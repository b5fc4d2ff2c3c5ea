use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;

use crate::config::JudgeConfig;

use super::inference::{build_request, parse_response};

/// External service producing a free-form trust assessment. The payload is
/// opaque text; nothing about its shape is assumed here.
pub trait JudgmentClient: Send + Sync {
    fn judge<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    config: JudgeConfig,
}

impl ChatCompletionsClient {
    pub fn new(http: Client, config: JudgeConfig) -> Self {
        Self { http, config }
    }

    pub async fn complete(&self, text: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .context("JUDGE_API_KEY or GOOGLE_API_KEY must be configured for analysis")?;

        tracing::info!(
            target: "judge",
            model = %self.config.model,
            chars = text.chars().count(),
            "requesting judgment"
        );

        let request = build_request(self.config.model.clone(), text);
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        parse_response(response).await
    }
}

impl JudgmentClient for ChatCompletionsClient {
    fn judge<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(text))
    }
}
