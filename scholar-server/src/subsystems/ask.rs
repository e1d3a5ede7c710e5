//! Ask subsystem: one question/answer round-trip
//!
//! validate → classify → load history → compose prompt → completion → persist.
//! The active session is passed in by the caller with every request; nothing
//! here remembers which session a user is working in.

use scholar_core::llm::{answer_or_apology, CompletionBackend};
use scholar_core::prompt::compose_prompt;
use scholar_core::store::{StoreError, StudyStore};
use scholar_core::{categorize_question, Subject};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question before submitting.";

#[derive(Error, Debug)]
pub enum AskError {
    #[error("{}", EMPTY_QUESTION_MESSAGE)]
    EmptyQuestion,

    #[error("Study session {0} not found. Please create a new session.")]
    UnknownSession(Uuid),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AskError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownSession(id) => AskError::UnknownSession(id),
            other => AskError::Store(other),
        }
    }
}

/// Result of a completed round-trip
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub exchange_id: Uuid,
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub subject: Option<Subject>,
}

/// Answer `question` within `session_id` and persist the exchange.
///
/// Completion failures do not fail the call: the error text becomes the
/// stored answer. Empty questions are rejected before anything else runs.
pub async fn submit_question(
    store: &StudyStore,
    backend: &dyn CompletionBackend,
    session_id: Uuid,
    question: &str,
) -> Result<AskOutcome, AskError> {
    if question.trim().is_empty() {
        return Err(AskError::EmptyQuestion);
    }

    if store.get_session(session_id).await?.is_none() {
        return Err(AskError::UnknownSession(session_id));
    }

    let subject = categorize_question(question);
    let history = store.list_exchanges(session_id).await?;

    let prompt = compose_prompt(
        question,
        history
            .iter()
            .map(|e| (e.question.as_str(), e.answer.as_str())),
        subject,
    );

    tracing::info!(
        session_id = %session_id,
        subject = subject.map(Subject::label).unwrap_or("none"),
        prior_exchanges = history.len(),
        "Submitting question"
    );

    let answer = answer_or_apology(backend, &prompt).await;

    let exchange_id = store
        .record_exchange(session_id, question, &answer, subject)
        .await?;

    Ok(AskOutcome {
        exchange_id,
        session_id,
        question: question.to_string(),
        answer,
        subject,
    })
}
