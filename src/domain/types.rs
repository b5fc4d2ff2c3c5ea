use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_TRUST_SCORE: u8 = 100;
pub const DEFAULT_SUMMARY: &str = "Analysis completed";

/// Trust percentage in `0..=100`. Deserializing an out-of-range value fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct TrustScore(u8);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("trust score {0} is outside 0..=100")]
pub struct TrustScoreOutOfRange(pub i64);

impl TrustScore {
    /// Medium-risk score used whenever the judgment gives no usable number.
    pub const NEUTRAL: TrustScore = TrustScore(50);

    pub fn new(value: i64) -> Result<Self, TrustScoreOutOfRange> {
        u8::try_from(value)
            .ok()
            .filter(|score| *score <= MAX_TRUST_SCORE)
            .map(TrustScore)
            .ok_or(TrustScoreOutOfRange(value))
    }

    pub fn clamped(value: i64) -> Self {
        TrustScore(value.clamp(0, i64::from(MAX_TRUST_SCORE)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TrustScore {
    type Error = TrustScoreOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        TrustScore::new(value)
    }
}

impl From<TrustScore> for u8 {
    fn from(score: TrustScore) -> Self {
        score.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationalFinding {
    pub title: String,
    pub explanation: String,
    pub quote: String,
}

impl EducationalFinding {
    pub fn new(
        title: impl Into<String>,
        explanation: impl Into<String>,
        quote: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            explanation: explanation.into(),
            quote: quote.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trust_score: TrustScore,
    pub result_summary: String,
    pub original_content: String,
    #[serde(rename = "educational_breakdown")]
    pub findings: Vec<EducationalFinding>,
}

impl AnalysisResult {
    pub fn new(
        trust_score: TrustScore,
        result_summary: impl Into<String>,
        original_content: impl Into<String>,
        findings: Vec<EducationalFinding>,
    ) -> Self {
        let mut result_summary = result_summary.into();
        if result_summary.trim().is_empty() {
            result_summary = DEFAULT_SUMMARY.to_string();
        }
        Self {
            trust_score,
            result_summary,
            original_content: original_content.into(),
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_score_rejects_out_of_range() {
        assert_eq!(TrustScore::new(120), Err(TrustScoreOutOfRange(120)));
        assert_eq!(TrustScore::new(-1), Err(TrustScoreOutOfRange(-1)));
        assert_eq!(TrustScore::new(100).map(TrustScore::value), Ok(100));
    }

    #[test]
    fn trust_score_clamps() {
        assert_eq!(TrustScore::clamped(120).value(), 100);
        assert_eq!(TrustScore::clamped(-40).value(), 0);
        assert_eq!(TrustScore::clamped(73).value(), 73);
    }

    #[test]
    fn blank_summary_gets_default() {
        let result = AnalysisResult::new(TrustScore::NEUTRAL, "  ", "text", Vec::new());
        assert_eq!(result.result_summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn serializes_with_wire_names() {
        let result = AnalysisResult::new(
            TrustScore::clamped(12),
            "Likely a scam",
            "Buy now",
            vec![EducationalFinding::new("Urgency", "Pushes the reader", "Buy now")],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["trust_score"], 12);
        assert_eq!(value["educational_breakdown"][0]["title"], "Urgency");
        assert!(value.get("findings").is_none());
    }

    #[test]
    fn deserializing_out_of_range_score_fails() {
        let raw = r#"{"trust_score":150,"result_summary":"x","original_content":"y","educational_breakdown":[]}"#;
        assert!(serde_json::from_str::<AnalysisResult>(raw).is_err());
    }
}
