use thiserror::Error;

use crate::web_content::ExtractionError;

/// Failures that reject a request. Anything that goes wrong at or after the
/// judgment call degrades the result instead and never shows up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("content is empty")]
    EmptyContent,
    #[error("content too short to analyze: {length} characters (minimum {minimum})")]
    ContentTooShort { length: usize, minimum: usize },
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AnalysisError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyContent | AnalysisError::ContentTooShort { .. }
        )
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            AnalysisError::EmptyContent => "empty",
            AnalysisError::ContentTooShort { .. } => "too_short",
            AnalysisError::Extraction(err) => err.reason_code(),
        }
    }
}
