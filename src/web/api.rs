//! REST API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::llm::{GatewayError, StructuredAnswer};
use crate::qna::QueryError;

/// Bounds on the submitted query text, in characters
const MIN_QUERY_LEN: usize = 5;
const MAX_QUERY_LEN: usize = 500;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Query submission request
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

/// Query submission response
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub ai_response: String,
    pub structured_data: Option<StructuredAnswer>,
    pub session_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Handle a user's question and record the interaction
pub async fn submit_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let len = req.query.chars().count();
    if !(MIN_QUERY_LEN..=MAX_QUERY_LEN).contains(&len) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(format!(
                "query must be between {MIN_QUERY_LEN} and {MAX_QUERY_LEN} characters"
            ))),
        ));
    }

    tracing::info!(user_id = ?req.user_id, "received query: {:?}", req.query);

    match state.qna.handle(&req.query, req.user_id, req.session_id).await {
        Ok(outcome) => Ok(Json(QueryResponse {
            ai_response: outcome.ai_response,
            structured_data: outcome.structured,
            session_id: outcome.session_id,
            user_id: outcome.user_id,
            timestamp: outcome.timestamp,
        })),
        Err(e) => Err(error_reply(e)),
    }
}

/// Map orchestrator failures onto HTTP statuses with non-leaking messages
fn error_reply(err: QueryError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        QueryError::Gateway(GatewayError::Configuration) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(
                "LLM service is not configured. Please set GEMINI_API_KEY.",
            )),
        ),
        QueryError::Gateway(GatewayError::Unavailable(reason)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new(format!("LLM service is unavailable: {reason}"))),
        ),
        QueryError::Gateway(GatewayError::Upstream { status, body }) => {
            // the raw upstream body is logged, never returned
            tracing::error!(status, "upstream LLM error: {}", body);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!(
                    "LLM provider returned status {status}"
                ))),
            )
        }
        QueryError::Internal(e) => {
            tracing::error!("internal error handling query: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "An internal server error occurred while processing your request.",
                )),
            )
        }
    }
}

/// One item in a user's query history
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub query: String,
    pub ai_response: String,
    pub session_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// History listing response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
    pub user_id: String,
}

/// Retrieve a user's query history, newest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::info!(%user_id, "retrieving history");

    match state.qna.history(&user_id) {
        Ok(records) => {
            let history = records
                .into_iter()
                .map(|record| HistoryItem {
                    query: record.query_text,
                    ai_response: record.response_text,
                    session_id: record.session_id,
                    user_id: record.user_id,
                    timestamp: record.timestamp,
                })
                .collect();
            Ok(Json(HistoryResponse { history, user_id }))
        }
        Err(e) => {
            tracing::error!("failed to list history: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to retrieve query history.")),
            ))
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Backend is healthy and running.".to_string(),
    })
}

/// Welcome message for the root path
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Root endpoint for basic access
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Interactive Q&A System Backend!".to_string(),
    })
}
