//! HTTP surface: `GET /health` and `POST /api/v1/analyze` (API-key guarded).

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analysis::Analyzer;

pub mod error;
pub mod handlers;

#[derive(Clone)]
pub struct ApiState {
    pub analyzer: Arc<Analyzer>,
    pub api_key: Arc<str>,
}

impl ApiState {
    pub fn new(analyzer: Arc<Analyzer>, api_key: &str) -> Self {
        Self {
            analyzer,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn build_router(state: ApiState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "http", origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use futures::future::BoxFuture;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        ai::JudgmentClient,
        analysis::AnalyzerSettings,
        cache::{MemoryStore, ResultCache},
        web_content::{ContentExtractor, ExtractionError},
    };

    struct FixedExtractor(Result<String, ExtractionError>);

    impl ContentExtractor for FixedExtractor {
        fn extract<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<String, ExtractionError>> {
            let page = self.0.clone();
            Box::pin(async move { page })
        }
    }

    struct FixedJudge(&'static str);

    impl JudgmentClient for FixedJudge {
        fn judge<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
            let reply = self.0.to_string();
            Box::pin(async move { Ok(reply) })
        }
    }

    fn app(page: Result<String, ExtractionError>) -> Router {
        let analyzer = Analyzer::new(
            Arc::new(FixedExtractor(page)),
            Arc::new(FixedJudge(
                r#"{"trust_score": 35, "result_summary": "Emotional manipulation", "educational_breakdown": [{"title": "Loaded language", "explanation": "Charged words", "quote": "outrageous"}]}"#,
            )),
            ResultCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60)),
            AnalyzerSettings::default(),
        );
        build_router(
            ApiState::new(Arc::new(analyzer), "secret"),
            &["http://localhost:5173".to_string()],
        )
    }

    fn analyze_request(api_key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(Ok(String::new()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn analyze_returns_result() {
        let response = app(Ok(String::new()))
            .oneshot(analyze_request(
                Some("secret"),
                r#"{"content": "This outrageous policy will destroy everything you love!"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["trust_score"], 35);
        assert_eq!(
            body["original_content"],
            "This outrageous policy will destroy everything you love!"
        );
        assert_eq!(body["educational_breakdown"][0]["title"], "Loaded language");
    }

    #[tokio::test]
    async fn missing_or_wrong_key_is_unauthorized() {
        for key in [None, Some("wrong")] {
            let response = app(Ok(String::new()))
                .oneshot(analyze_request(key, r#"{"content": "whatever you say"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                "Bearer"
            );
        }
    }

    #[tokio::test]
    async fn validation_failure_is_bad_request() {
        let response = app(Ok(String::new()))
            .oneshot(analyze_request(Some("secret"), r#"{"content": "short"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
        assert_eq!(body["reason"], "too_short");
    }

    #[tokio::test]
    async fn extraction_failure_is_unprocessable() {
        let response = app(Err(ExtractionError::HttpStatus(503)))
            .oneshot(analyze_request(
                Some("secret"),
                r#"{"content": "https://example.com/down"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], "EXTRACTION_ERROR");
        assert_eq!(body["reason"], "http_error");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let response = app(Ok(String::new()))
            .oneshot(analyze_request(Some("secret"), r#"{"text": 1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_code"], "BAD_REQUEST");
    }
}
