//! Scholar HTTP REST API
//!
//! Axum-based HTTP server exposing the study assistant. Runs alongside the Unix
//! socket IPC server; both dispatch through `router::handle_request`.
//!
//! Each endpoint has a thin axum handler that delegates to an inner function
//! returning `(StatusCode, serde_json::Value)`, so the logic is testable without
//! axum dispatch.
//!
//! Endpoints:
//! - GET    /health                : health check with DB status
//! - GET    /version               : server version info
//! - GET    /sessions              : list sessions, most recent first
//! - POST   /sessions              : create a session
//! - GET    /sessions/:id          : session metadata
//! - DELETE /sessions/:id          : delete a session and its exchanges
//! - GET    /sessions/:id/exchanges: chat history, oldest first
//! - POST   /sessions/:id/ask      : ask a question in a session
//! - GET    /sessions/:id/export   : plain-text transcript download
//! - POST   /exchanges/:id/rating  : thumbs up/down with optional feedback
//! - POST   /exchanges/:id/feedback: feedback only, rating kept
//! - GET    /stats                 : aggregate counters

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use scholar_core::ipc::{ErrorKind, ScholarRequest, ScholarResponse};
use scholar_core::{Rating, ScholarConfig};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::router::{self, Services};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub services: Services,
    pub config: ScholarConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/sessions", get(list_sessions_handler).post(create_session_handler))
        .route("/sessions/:id", get(get_session_handler).delete(delete_session_handler))
        .route("/sessions/:id/exchanges", get(history_handler))
        .route("/sessions/:id/ask", post(ask_handler))
        .route("/sessions/:id/export", get(export_handler))
        .route("/exchanges/:id/rating", post(rate_handler))
        .route("/exchanges/:id/feedback", post(feedback_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    services: Services,
    config: ScholarConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { services, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Scholar HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct CreateSessionRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AskRequest {
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: Rating,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check: queries DB and returns (status_code, json_body).
pub async fn health_inner(services: &Services, socket_path: &str) -> (StatusCode, serde_json::Value) {
    let pg_ver = match scholar_core::db::health_check(services.store.pool()).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "postgresql": pg_ver,
            "model": services.backend.model(),
            "socket": socket_path,
        }),
    )
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "scholar/1",
    })
}

/// Dispatch a request through the shared router and map it onto HTTP.
pub async fn dispatch(services: &Services, request: ScholarRequest) -> (StatusCode, serde_json::Value) {
    let response = router::handle_request(request, services).await;
    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err((status, error)) => (
            status,
            serde_json::json!({
                "error": error,
                "status": "error",
            }),
        ),
    }
}

/// Inner ask: rejects a missing or blank question with 400 before dispatching.
pub async fn ask_inner(
    services: &Services,
    session_id: Uuid,
    req: AskRequest,
) -> (StatusCode, serde_json::Value) {
    let question = req.question.unwrap_or_default();
    dispatch(services, ScholarRequest::Ask { session_id, question }).await
}

/// Inner export: the transcript body plus its download file name.
pub async fn export_inner(
    services: &Services,
    session_id: Uuid,
) -> Result<(String, String), (StatusCode, serde_json::Value)> {
    let (status, body) = dispatch(services, ScholarRequest::Export { session_id }).await;
    if status != StatusCode::OK {
        return Err((status, body));
    }
    let file_name = body["file_name"].as_str().unwrap_or("study_session.txt").to_string();
    let content = body["content"].as_str().unwrap_or_default().to_string();
    Ok((file_name, content))
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.services, &state.config.service.socket_path).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn list_sessions_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = dispatch(&state.services, ScholarRequest::ListSessions).await;
    (status, Json(body))
}

pub async fn create_session_handler(
    State(state): State<Arc<HttpState>>,
    req: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let name = req.and_then(|Json(r)| r.name);
    let (status, body) = dispatch(&state.services, ScholarRequest::CreateSession { name }).await;
    let status = if status == StatusCode::OK { StatusCode::CREATED } else { status };
    (status, Json(body))
}

pub async fn get_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = dispatch(&state.services, ScholarRequest::GetSession { session_id }).await;
    (status, Json(body))
}

pub async fn delete_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = dispatch(&state.services, ScholarRequest::DeleteSession { session_id }).await;
    (status, Json(body))
}

pub async fn history_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = dispatch(&state.services, ScholarRequest::History { session_id }).await;
    (status, Json(body))
}

pub async fn ask_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let (status, body) = ask_inner(&state.services, session_id, req).await;
    (status, Json(body))
}

pub async fn export_handler(
    State(state): State<Arc<HttpState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    match export_inner(&state.services, session_id).await {
        Ok((file_name, content)) => transcript_response(&file_name, content),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn rate_handler(
    State(state): State<Arc<HttpState>>,
    Path(exchange_id): Path<Uuid>,
    Json(req): Json<RateRequest>,
) -> impl IntoResponse {
    let request = ScholarRequest::Rate {
        exchange_id,
        rating: req.rating,
        feedback: req.feedback,
    };
    let (status, body) = dispatch(&state.services, request).await;
    (status, Json(body))
}

pub async fn feedback_handler(
    State(state): State<Arc<HttpState>>,
    Path(exchange_id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let request = ScholarRequest::Feedback {
        exchange_id,
        feedback: req.feedback,
    };
    let (status, body) = dispatch(&state.services, request).await;
    (status, Json(body))
}

pub async fn stats_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = dispatch(&state.services, ScholarRequest::Stats).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Plain-text download response for an exported transcript.
pub fn transcript_response(file_name: &str, content: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        content,
    )
        .into_response()
}

/// Convert an IPC `ScholarResponse` into an HTTP body value, or a status and error string.
pub fn response_to_http(
    response: ScholarResponse,
) -> std::result::Result<serde_json::Value, (StatusCode, String)> {
    if response.is_ok() {
        return Ok(response.data.unwrap_or(serde_json::json!({})));
    }

    let status = match response.error_kind {
        Some(ErrorKind::Invalid) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Internal) | None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Err((status, response.error.unwrap_or_else(|| "unknown error".to_string())))
}

// ============================================================================
// Unit Tests: pure helpers only; DB-backed paths live in tests/
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::export::transcript_file_name;

    #[test]
    fn test_transcript_response_for_awkward_session_names() {
        for name in ["Exam\nprep", "My \"quoted\" notes", "Biology Review"] {
            let resp = transcript_response(&transcript_file_name(name), "notes".to_string());
            assert_eq!(resp.status(), StatusCode::OK, "name: {:?}", name);

            let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
            assert!(disposition.starts_with("attachment; filename=\"study_session_"));
            assert_eq!(disposition.matches('"').count(), 2, "header: {}", disposition);
        }
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "scholar/1");
    }

    #[test]
    fn test_response_to_http_ok() {
        let resp = ScholarResponse::ok(serde_json::json!({"sessions": [], "count": 0}));
        let data = response_to_http(resp).unwrap();
        assert_eq!(data["count"], 0);
    }

    #[test]
    fn test_response_to_http_ok_no_data() {
        let mut resp = ScholarResponse::ok(serde_json::json!({}));
        resp.data = None;
        assert!(response_to_http(resp).unwrap().is_object());
    }

    #[test]
    fn test_response_to_http_maps_error_kinds() {
        let cases = [
            (ErrorKind::Invalid, StatusCode::BAD_REQUEST),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, expected) in cases {
            let (status, msg) = response_to_http(ScholarResponse::rejected(kind, "nope")).unwrap_err();
            assert_eq!(status, expected);
            assert_eq!(msg, "nope");
        }
    }

    #[test]
    fn test_response_to_http_error_no_message() {
        let mut resp = ScholarResponse::err("x");
        resp.error = None;
        resp.error_kind = None;
        let (status, msg) = response_to_http(resp).unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "unknown error");
    }
}
