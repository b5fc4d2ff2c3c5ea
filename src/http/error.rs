use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, reason) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "INVALID_API_KEY", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Analysis(err) if err.is_validation() => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                Some(err.reason_code()),
            ),
            ApiError::Analysis(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                Some(err.reason_code()),
            ),
        };

        tracing::warn!(target: "http", status = status.as_u16(), error = %self, "request rejected");

        let body = Json(json!({
            "detail": self.to_string(),
            "error_code": error_code,
            "reason": reason,
        }));

        if matches!(self, ApiError::Unauthorized) {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
