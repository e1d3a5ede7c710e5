use std::sync::Arc;

use crate::subsystems::ask::{self, AskError};
use crate::subsystems::transcript;
use scholar_core::ipc::{ErrorKind, ScholarRequest, ScholarResponse};
use scholar_core::llm::CompletionBackend;
use scholar_core::models::session::default_session_name;
use scholar_core::store::{StoreError, StudyStore};
use uuid::Uuid;

/// Everything a request handler needs; shared by the IPC and HTTP front ends.
#[derive(Clone)]
pub struct Services {
    pub store: StudyStore,
    pub backend: Arc<dyn CompletionBackend>,
}

impl Services {
    pub fn new(store: StudyStore, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { store, backend }
    }
}

fn store_failure(context: &str, e: StoreError) -> ScholarResponse {
    tracing::error!(error = %e, "{} failed", context);
    match e {
        StoreError::UnknownSession(id) => session_not_found(id),
        other => ScholarResponse::err(format!("{} failed: {}", context, other)),
    }
}

fn session_not_found(id: Uuid) -> ScholarResponse {
    ScholarResponse::rejected(ErrorKind::NotFound, format!("Study session {} not found", id))
}

fn exchange_not_found(id: Uuid) -> ScholarResponse {
    ScholarResponse::rejected(ErrorKind::NotFound, format!("Chat exchange {} not found", id))
}

pub async fn handle_request(request: ScholarRequest, services: &Services) -> ScholarResponse {
    let store = &services.store;

    match request {
        ScholarRequest::Ping => ScholarResponse::pong(),
        ScholarRequest::Health => match scholar_core::db::health_check(store.pool()).await {
            Ok(v) => ScholarResponse::ok(serde_json::json!({
                "postgresql": v,
                "model": services.backend.model(),
                "status": "healthy"
            })),
            Err(e) => ScholarResponse::err(format!("DB Health Check failed: {}", e)),
        },
        ScholarRequest::CreateSession { name } => {
            let name = name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| default_session_name(chrono::Local::now()));
            match store.create_session(&name).await {
                Ok(id) => ScholarResponse::ok(serde_json::json!({ "id": id, "name": name })),
                Err(e) => store_failure("Create session", e),
            }
        }
        ScholarRequest::ListSessions => match store.list_sessions().await {
            Ok(sessions) => ScholarResponse::ok(serde_json::json!({
                "count": sessions.len(),
                "sessions": sessions,
            })),
            Err(e) => store_failure("List sessions", e),
        },
        ScholarRequest::GetSession { session_id } => match store.get_session(session_id).await {
            Ok(Some(session)) => ScholarResponse::ok(serde_json::json!(session)),
            Ok(None) => session_not_found(session_id),
            Err(e) => store_failure("Get session", e),
        },
        ScholarRequest::Ask { session_id, question } => {
            match ask::submit_question(store, services.backend.as_ref(), session_id, &question).await
            {
                Ok(outcome) => ScholarResponse::ok(serde_json::json!(outcome)),
                Err(AskError::EmptyQuestion) => ScholarResponse::rejected(
                    ErrorKind::Invalid,
                    ask::EMPTY_QUESTION_MESSAGE,
                ),
                Err(AskError::UnknownSession(id)) => session_not_found(id),
                Err(AskError::Store(e)) => store_failure("Ask", e),
            }
        }
        ScholarRequest::History { session_id } => {
            match store.get_session(session_id).await {
                Ok(Some(_)) => {}
                Ok(None) => return session_not_found(session_id),
                Err(e) => return store_failure("History", e),
            }
            match store.list_exchanges(session_id).await {
                Ok(exchanges) => ScholarResponse::ok(serde_json::json!({
                    "session_id": session_id,
                    "count": exchanges.len(),
                    "exchanges": exchanges,
                })),
                Err(e) => store_failure("History", e),
            }
        }
        ScholarRequest::Rate { exchange_id, rating, feedback } => {
            match store.update_rating(exchange_id, rating, feedback.as_deref()).await {
                Ok(true) => ScholarResponse::ok(serde_json::json!({
                    "updated": true,
                    "id": exchange_id,
                    "rating": rating,
                })),
                Ok(false) => exchange_not_found(exchange_id),
                Err(e) => store_failure("Rate", e),
            }
        }
        ScholarRequest::Feedback { exchange_id, feedback } => {
            match store.update_feedback(exchange_id, &feedback).await {
                Ok(true) => ScholarResponse::ok(serde_json::json!({ "updated": true, "id": exchange_id })),
                Ok(false) => exchange_not_found(exchange_id),
                Err(e) => store_failure("Feedback", e),
            }
        }
        ScholarRequest::DeleteSession { session_id } => {
            match store.delete_session(session_id).await {
                Ok(true) => ScholarResponse::ok(serde_json::json!({ "deleted": true, "id": session_id })),
                Ok(false) => session_not_found(session_id),
                Err(e) => store_failure("Delete session", e),
            }
        }
        ScholarRequest::Stats => match store.stats().await {
            Ok(stats) => ScholarResponse::ok(serde_json::json!(stats)),
            Err(e) => store_failure("Stats", e),
        },
        ScholarRequest::Export { session_id } => {
            match transcript::export_session(store, session_id).await {
                Ok(Some(t)) => ScholarResponse::ok(serde_json::json!(t)),
                Ok(None) => session_not_found(session_id),
                Err(e) => store_failure("Export", e),
            }
        }
    }
}
