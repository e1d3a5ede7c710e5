//! Persistence layer for study sessions and chat exchanges
//!
//! Every operation checks a connection out of the pool (or opens a transaction)
//! for its own duration only. Multi-statement writes run inside a
//! `sqlx::Transaction`; an uncommitted transaction is rolled back when dropped,
//! so early returns through `?` never leave partial state behind.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::Subject;
use crate::models::{ChatExchange, Rating, SessionStats, StudySession};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Study session {0} does not exist")]
    UnknownSession(Uuid),

    #[error("Corrupt row in chat_exchanges ({id}): {detail}")]
    CorruptRow { id: Uuid, detail: String },
}

#[derive(sqlx::FromRow)]
struct ExchangeRow {
    id: Uuid,
    session_id: Uuid,
    question: String,
    answer: String,
    subject_category: Option<String>,
    rating: Option<i16>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExchangeRow> for ChatExchange {
    type Error = StoreError;

    fn try_from(row: ExchangeRow) -> Result<Self, Self::Error> {
        let corrupt = |detail: String| StoreError::CorruptRow { id: row.id, detail };

        let subject = row
            .subject_category
            .as_deref()
            .map(|label| label.parse::<Subject>())
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;
        let rating = row
            .rating
            .map(Rating::try_from)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(ChatExchange {
            id: row.id,
            session_id: row.session_id,
            question: row.question,
            answer: row.answer,
            subject,
            rating,
            feedback: row.feedback,
            created_at: row.created_at,
        })
    }
}

/// Handle over the study tables. Cheap to clone (wraps the pool).
#[derive(Debug, Clone)]
pub struct StudyStore {
    pool: PgPool,
}

impl StudyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_session(&self, name: &str) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO study_sessions (id, session_name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        tracing::info!(session_id = %id, name, "Created study session");
        Ok(id)
    }

    /// All sessions, most recently active first.
    pub async fn list_sessions(&self) -> Result<Vec<StudySession>, StoreError> {
        let sessions = sqlx::query_as::<_, StudySession>(
            r#"
            SELECT id, session_name, created_at, updated_at
            FROM study_sessions
            ORDER BY updated_at DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<StudySession>, StoreError> {
        let session = sqlx::query_as::<_, StudySession>(
            "SELECT id, session_name, created_at, updated_at FROM study_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Persist one question/answer round-trip and touch the session's `updated_at`.
    ///
    /// Fails with [`StoreError::UnknownSession`] when `session_id` does not exist.
    pub async fn record_exchange(
        &self,
        session_id: Uuid,
        question: &str,
        answer: &str,
        subject: Option<Subject>,
    ) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE study_sessions SET updated_at = now() WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(StoreError::UnknownSession(session_id));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO chat_exchanges (id, session_id, question, answer, subject_category)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(session_id)
        .bind(question)
        .bind(answer)
        .bind(subject.map(Subject::label))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            session_id = %session_id,
            exchange_id = %id,
            subject = subject.map(Subject::label).unwrap_or("none"),
            "Recorded chat exchange"
        );
        Ok(id)
    }

    /// Exchanges of one session in the order they were recorded.
    pub async fn list_exchanges(&self, session_id: Uuid) -> Result<Vec<ChatExchange>, StoreError> {
        let rows = sqlx::query_as::<_, ExchangeRow>(
            r#"
            SELECT id, session_id, question, answer, subject_category, rating, feedback, created_at
            FROM chat_exchanges
            WHERE session_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatExchange::try_from).collect()
    }

    /// Overwrite the rating; replace feedback only when a non-empty one is given.
    ///
    /// Returns `false` if the exchange does not exist.
    pub async fn update_rating(
        &self,
        exchange_id: Uuid,
        rating: Rating,
        feedback: Option<&str>,
    ) -> Result<bool, StoreError> {
        let feedback = feedback.filter(|f| !f.is_empty());
        let result = sqlx::query(
            r#"
            UPDATE chat_exchanges
            SET rating = $2, feedback = COALESCE($3, feedback)
            WHERE id = $1
            "#,
        )
        .bind(exchange_id)
        .bind(rating.value())
        .bind(feedback)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            tracing::debug!(exchange_id = %exchange_id, rating = rating.value(), "Updated rating");
        }
        Ok(updated)
    }

    /// Replace feedback while keeping whatever rating is already stored.
    ///
    /// Empty feedback is a no-op. Returns `false` if the exchange does not exist.
    pub async fn update_feedback(&self, exchange_id: Uuid, feedback: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_exchanges
            SET feedback = COALESCE(NULLIF($2, ''), feedback)
            WHERE id = $1
            "#,
        )
        .bind(exchange_id)
        .bind(feedback)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a session together with all of its exchanges, atomically.
    ///
    /// Returns `false` if there was no such session.
    pub async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exchanges = sqlx::query("DELETE FROM chat_exchanges WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        let sessions = sqlx::query("DELETE FROM study_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = sessions.rows_affected() > 0;
        tracing::info!(
            session_id = %session_id,
            deleted,
            exchanges_removed = exchanges.rows_affected(),
            "Deleted study session"
        );
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<SessionStats, StoreError> {
        let (total_sessions, total_exchanges, average_rating): (i64, i64, Option<f64>) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM study_sessions),
                    (SELECT COUNT(*) FROM chat_exchanges),
                    (SELECT ROUND(AVG(rating)::numeric, 2)::float8
                     FROM chat_exchanges WHERE rating IS NOT NULL)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(SessionStats {
            total_sessions,
            total_exchanges,
            average_rating,
        })
    }
}
