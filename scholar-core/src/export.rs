//! Plain-text transcript export for a study session

use chrono::{DateTime, Utc};

use crate::models::{ChatExchange, StudySession};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER_RULE_WIDTH: usize = 50;
const EXCHANGE_RULE_WIDTH: usize = 30;

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a session and its exchanges (oldest first) as a study-notes document.
pub fn render_transcript(session: &StudySession, exchanges: &[ChatExchange]) -> String {
    let mut out = format!(
        "Study Session: {}\nCreated: {}\n{}\n\n",
        session.name,
        timestamp(&session.created_at),
        "=".repeat(HEADER_RULE_WIDTH)
    );

    for (i, exchange) in exchanges.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!("Question {}:\n{}\n\n", n, exchange.question));
        out.push_str(&format!("Answer {}:\n{}\n\n", n, exchange.answer));

        if let Some(subject) = exchange.subject {
            out.push_str(&format!("Subject: {}\n", subject));
        }
        if let Some(rating) = exchange.rating {
            out.push_str(&format!("Rating: {}\n", rating.glyph()));
        }
        if let Some(feedback) = exchange.feedback.as_deref().filter(|f| !f.is_empty()) {
            out.push_str(&format!("Feedback: {}\n", feedback));
        }

        out.push_str(&format!(
            "Time: {}\n{}\n\n",
            timestamp(&exchange.created_at),
            "-".repeat(EXCHANGE_RULE_WIDTH)
        ));
    }

    out
}

/// Download file name for a session transcript.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, so the name is always a
/// valid quoted `Content-Disposition` filename.
pub fn transcript_file_name(session_name: &str) -> String {
    let safe: String = session_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("study_session_{}.txt", safe)
}
