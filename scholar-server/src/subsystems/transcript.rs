use scholar_core::export::{render_transcript, transcript_file_name};
use scholar_core::store::{StoreError, StudyStore};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub session_id: Uuid,
    pub file_name: String,
    pub exchange_count: usize,
    pub content: String,
}

/// Build the export document for a session; `None` if the session is gone.
pub async fn export_session(
    store: &StudyStore,
    session_id: Uuid,
) -> Result<Option<Transcript>, StoreError> {
    let session = match store.get_session(session_id).await? {
        Some(s) => s,
        None => return Ok(None),
    };
    let exchanges = store.list_exchanges(session_id).await?;

    tracing::debug!(session_id = %session_id, exchanges = exchanges.len(), "Exporting transcript");

    Ok(Some(Transcript {
        session_id,
        file_name: transcript_file_name(&session.name),
        exchange_count: exchanges.len(),
        content: render_transcript(&session, &exchanges),
    }))
}
