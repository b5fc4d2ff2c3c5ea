pub mod request;
pub mod types;

pub use request::AnalysisRequest;
pub use types::{AnalysisResult, EducationalFinding, TrustScore};
