use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudySession {
    pub id: Uuid,
    #[sqlx(rename = "session_name")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name given to a session created without an explicit one,
/// e.g. `Study Session 2026-03-14 09:30`.
pub fn default_session_name(now: DateTime<Local>) -> String {
    format!("Study Session {}", now.format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_session_name_uses_minute_precision() {
        let now = Local.with_ymd_and_hms(2026, 3, 14, 9, 30, 59).unwrap();
        assert_eq!(default_session_name(now), "Study Session 2026-03-14 09:30");
    }
}
