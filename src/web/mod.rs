//! Web server module
//!
//! HTTP surface for query submission and history retrieval.

pub mod api;
pub mod state;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db::Database;
use crate::llm::GeminiClient;
use crate::qna::QnaService;
use state::AppState;

/// Start the web server
pub async fn serve(config: Config) -> Result<()> {
    let db = Database::open_at(config.database_path.clone())?;
    let gateway = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.model.clone(),
    )?);
    let state = AppState::new(QnaService::new(gateway, db));

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("starting server on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/query", post(api::submit_query))
        .route("/history/{user_id}", get(api::get_history));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(api::health_check))
        .route("/", get(api::root))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Answer, GatewayResult, LlmGateway, StructuredAnswer};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    struct FixedGateway {
        result: fn() -> GatewayResult<Answer>,
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        async fn answer(&self, _query: &str) -> GatewayResult<Answer> {
            (self.result)()
        }
    }

    fn test_router(result: fn() -> GatewayResult<Answer>) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(dir.path().join("test.db")).unwrap();
        let state = AppState::new(QnaService::new(Arc::new(FixedGateway { result }), db));
        (create_router(state), dir)
    }

    async fn send_json(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let (router, _dir) = test_router(|| Ok(Answer::Unstructured("hi".to_string())));
        let (status, body) = send_json(router, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn short_query_is_rejected() {
        let (router, _dir) = test_router(|| Ok(Answer::Unstructured("hi".to_string())));
        let (status, body) =
            send_json(router, "POST", "/api/v1/query", Some(json!({ "query": "hey" }))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("between"));
    }

    #[tokio::test]
    async fn query_returns_rendered_answer_and_ids() {
        let (router, _dir) = test_router(|| {
            Ok(Answer::Structured(StructuredAnswer {
                passport_requirements: vec!["Valid for 6 months".to_string()],
                ..Default::default()
            }))
        });

        let (status, body) = send_json(
            router,
            "POST",
            "/api/v1/query",
            Some(json!({ "query": "What documents do I need to travel to Japan?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["ai_response"],
            "**Passport Requirements:**\n- Valid for 6 months"
        );
        assert_eq!(
            body["structured_data"]["passport_requirements"][0],
            "Valid for 6 months"
        );
        assert!(!body["user_id"].as_str().unwrap().is_empty());
        assert!(!body["session_id"].as_str().unwrap().is_empty());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unstructured_answer_has_null_structured_data() {
        let (router, _dir) = test_router(|| Ok(Answer::Unstructured("plain text".to_string())));

        let (status, body) = send_json(
            router,
            "POST",
            "/api/v1/query",
            Some(json!({ "query": "hello over there" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ai_response"], "plain text");
        assert!(body["structured_data"].is_null());
    }

    #[tokio::test]
    async fn unconfigured_llm_maps_to_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(dir.path().join("test.db")).unwrap();
        // real gateway with no key: fails before any request is sent
        let gateway = Arc::new(GeminiClient::new(None, "gemini-test").unwrap());
        let router = create_router(AppState::new(QnaService::new(gateway, db)));

        let (status, body) = send_json(
            router,
            "POST",
            "/api/v1/query",
            Some(json!({ "query": "hello over there" })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn history_lists_submitted_queries() {
        let (router, _dir) = test_router(|| Ok(Answer::Unstructured("an answer".to_string())));

        let (status, body) = send_json(
            router.clone(),
            "POST",
            "/api/v1/query",
            Some(json!({ "query": "hello over there", "user_id": "user-42" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body2) =
            send_json(router, "GET", "/api/v1/history/user-42", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body2["user_id"], "user-42");
        assert_eq!(body2["history"].as_array().unwrap().len(), 1);
        assert_eq!(body2["history"][0]["query"], "hello over there");
        assert_eq!(body2["history"][0]["ai_response"], "an answer");
        assert_eq!(body2["history"][0]["session_id"], body["session_id"]);
    }

    #[tokio::test]
    async fn history_for_unknown_user_is_empty() {
        let (router, _dir) = test_router(|| Ok(Answer::Unstructured("hi".to_string())));

        let (status, body) = send_json(router, "GET", "/api/v1/history/nobody", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"].as_array().unwrap().len(), 0);
    }
}
