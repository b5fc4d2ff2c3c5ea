use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::domain::{AnalysisRequest, AnalysisResult};

use super::{
    error::{ApiError, ApiResult},
    ApiState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/v1/analyze
pub async fn analyze(
    State(state): State<ApiState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResult>> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    tracing::info!(
        target: "http",
        length = request.content.chars().count(),
        "analysis request received"
    );

    let result = state.analyzer.analyze(&request).await?;
    Ok(Json(result))
}

pub async fn require_api_key(
    State(state): State<ApiState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.api_key.as_ref()) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
