//! Turns the judgment service's free-form reply into a well-formed
//! [`Judgment`]. Every path through here yields a usable value: fields are
//! repaired one by one, and a payload that cannot be decoded at all becomes a
//! synthetic medium-risk judgment.

use serde_json::{Map, Value};

use crate::domain::{types::DEFAULT_SUMMARY, EducationalFinding, TrustScore};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";
const UNTITLED_FINDING: &str = "Untitled finding";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentOutcome {
    /// Decoded from the service's reply, possibly with repaired fields.
    Parsed,
    /// The reply arrived but held no decodable object.
    Unparseable,
    /// The service could not be reached or refused the call.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub trust_score: TrustScore,
    pub summary: String,
    pub findings: Vec<EducationalFinding>,
    pub outcome: JudgmentOutcome,
}

impl Judgment {
    pub fn unparseable() -> Self {
        Self {
            trust_score: TrustScore::NEUTRAL,
            summary: "Analysis completed but response format was unexpected".to_string(),
            findings: vec![EducationalFinding::new(
                "Analysis Note",
                "The AI analysis was completed but the response format was not as expected.",
                "Response received from AI model",
            )],
            outcome: JudgmentOutcome::Unparseable,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            trust_score: TrustScore::NEUTRAL,
            summary: format!("Analysis failed: {reason}"),
            findings: vec![EducationalFinding::new(
                "Analysis Error",
                "The AI analysis encountered an error and could not complete properly.",
                "Error occurred during analysis",
            )],
            outcome: JudgmentOutcome::Unavailable,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.outcome != JudgmentOutcome::Parsed
    }
}

pub fn interpret(raw: &str) -> Judgment {
    let candidate = candidate_block(raw);
    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            tracing::warn!(
                target: "judge",
                kind = value_kind(&other),
                "judgment payload is not an object"
            );
            return Judgment::unparseable();
        }
        Err(err) => {
            tracing::warn!(target: "judge", error = %err, "failed to decode judgment payload");
            return Judgment::unparseable();
        }
    };

    let judgment = Judgment {
        trust_score: repair_score(object.get("trust_score")),
        summary: repair_summary(object.get("result_summary")),
        findings: repair_findings(object.get("educational_breakdown")),
        outcome: JudgmentOutcome::Parsed,
    };
    tracing::info!(
        target: "judge",
        trust_score = judgment.trust_score.value(),
        findings = judgment.findings.len(),
        "judgment interpreted"
    );
    judgment
}

/// Picks the span most likely to hold the structured object: a ```json fence,
/// else the outermost braces, else the whole payload.
fn candidate_block(raw: &str) -> &str {
    if let Some(start) = raw.find(JSON_FENCE) {
        let body = &raw[start + JSON_FENCE.len()..];
        let end = body.find(FENCE).unwrap_or(body.len());
        return body[..end].trim();
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return &raw[start..=end];
        }
    }

    raw.trim()
}

fn repair_score(value: Option<&Value>) -> TrustScore {
    match value.and_then(Value::as_i64) {
        Some(score) => {
            let clamped = TrustScore::clamped(score);
            if i64::from(clamped.value()) != score {
                tracing::warn!(target: "judge", score, "trust score out of range; clamped");
            }
            clamped
        }
        None => TrustScore::NEUTRAL,
    }
}

fn repair_summary(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|summary| !summary.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string()
}

fn repair_findings(value: Option<&Value>) -> Vec<EducationalFinding> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            EducationalFinding::new(
                string_field(item, "title")
                    .filter(|title| !title.is_empty())
                    .unwrap_or(UNTITLED_FINDING),
                string_field(item, "explanation").unwrap_or_default(),
                string_field(item, "quote").unwrap_or_default(),
            )
        })
        .collect()
}

fn string_field<'a>(item: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).map(str::trim)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
