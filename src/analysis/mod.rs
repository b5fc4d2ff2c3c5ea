pub mod classifier;
pub mod error;
pub mod orchestrator;

pub use error::AnalysisError;
pub use orchestrator::{Analyzer, AnalyzerSettings};
