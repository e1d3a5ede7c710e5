//! scholar-cli: command-line frontend for the Scholar study assistant
//!
//! Talks to the Scholar HTTP API. Every command that works inside a study
//! session takes the session id explicitly; the CLI keeps no local state.
//!
//! # Subcommands
//! - `new [name]`                        : start a study session
//! - `sessions`                          : list sessions, most recent first
//! - `ask <session> <question>`          : ask a question in a session
//! - `history <session>`                 : show a session's exchanges
//! - `rate <exchange> up|down [-f text]` : rate an answer
//! - `feedback <exchange> <text>`        : comment on an answer
//! - `delete <session>`                  : delete a session and its history
//! - `stats`                             : overall usage counters
//! - `export <session> [-o file|--save]` : plain-text study notes
//! - `status`                            : show server health

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";
const TITLE_MAX_CHARS: usize = 60;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "scholar-cli", version, about = "Scholar AI study assistant")]
struct Cli {
    /// Scholar HTTP server URL (overrides SCHOLAR_HTTP_URL env var)
    #[arg(long, env = "SCHOLAR_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a new study session
    New {
        /// Session name (defaults to a timestamped name)
        name: Option<String>,
    },

    /// List study sessions, most recently used first
    Sessions,

    /// Ask a question within a study session
    Ask {
        /// Session id
        session: String,

        /// The question text
        question: String,
    },

    /// Show the questions and answers of a session
    History {
        /// Session id
        session: String,

        /// Print full questions and answers instead of titles
        #[arg(long)]
        full: bool,
    },

    /// Rate an answer
    Rate {
        /// Exchange id
        exchange: String,

        rating: RatingArg,

        /// Optional comment stored with the rating
        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Add a comment to an answer without changing its rating
    Feedback {
        /// Exchange id
        exchange: String,

        text: String,
    },

    /// Delete a session and all of its exchanges
    Delete {
        /// Session id
        session: String,
    },

    /// Show overall usage statistics
    Stats,

    /// Export a session as plain-text study notes
    Export {
        /// Session id
        session: String,

        /// Write to this file instead of stdout
        #[arg(short, long, conflicts_with = "save")]
        output: Option<String>,

        /// Write to the server-suggested file name in the current directory
        #[arg(long)]
        save: bool,
    },

    /// Show Scholar server status
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RatingArg {
    Up,
    Down,
}

impl RatingArg {
    fn as_str(self) -> &'static str {
        match self {
            RatingArg::Up => "up",
            RatingArg::Down => "down",
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct Exchange {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub subject: Option<String>,
    pub rating: Option<String>,
    pub feedback: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct History {
    pub exchanges: Vec<Exchange>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskResult {
    pub exchange_id: String,
    pub answer: String,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Stats {
    pub total_sessions: i64,
    pub total_exchanges: i64,
    pub average_rating: Option<f64>,
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Question shown as a one-line title, cut at 60 characters.
pub fn question_title(question: &str) -> String {
    if question.chars().count() > TITLE_MAX_CHARS {
        let head: String = question.chars().take(TITLE_MAX_CHARS).collect();
        format!("Q: {}...", head)
    } else {
        format!("Q: {}", question)
    }
}

/// One row of the `sessions` listing.
pub fn session_line(session: &SessionSummary) -> String {
    format!(
        "{}  {}  (created {}, updated {})",
        session.id, session.name, session.created_at, session.updated_at
    )
}

pub fn rating_label(rating: Option<&str>) -> &'static str {
    match rating {
        Some("up") => "👍 Rated positively",
        Some("down") => "👎 Rated negatively",
        _ => "Not rated",
    }
}

/// Lines for the stats view; a single notice when nothing has been recorded.
pub fn stats_lines(stats: &Stats) -> Vec<String> {
    if stats.total_sessions == 0 {
        return vec!["No study sessions yet".to_string()];
    }

    let mut lines = vec![
        format!("Total Sessions:  {}", stats.total_sessions),
        format!("Total Questions: {}", stats.total_exchanges),
    ];
    if let Some(avg) = stats.average_rating {
        lines.push(format!("Avg Rating:      {:+.2}", avg));
    }
    lines
}

/// Extract `filename="..."` from a Content-Disposition header.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let start = header.find("filename=")? + "filename=".len();
    let name = header[start..].trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<Client> {
    // Completions can take a while; the server's own timeout is 60s.
    Ok(Client::builder().timeout(Duration::from_secs(90)).build()?)
}

/// Send a request and exit with the server's error message on failure.
fn send(request: RequestBuilder, url: &str) -> Response {
    let resp = match request.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("scholar-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("no details");
        eprintln!("scholar-cli: server returned {}: {}", status, message);
        std::process::exit(1);
    }

    resp
}

fn parse<T: for<'de> Deserialize<'de>>(resp: Response, what: &str) -> T {
    match resp.json() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("scholar-cli: failed to parse {} response: {}", what, e);
            std::process::exit(1);
        }
    }
}

fn do_new(server: &str, name: Option<String>) -> anyhow::Result<()> {
    let url = format!("{}/sessions", server);
    let body = serde_json::json!({ "name": name });
    let resp = send(client()?.post(&url).json(&body), &url);
    let created: serde_json::Value = parse(resp, "create session");

    println!("Created study session: {}", created["name"].as_str().unwrap_or("?"));
    println!("Session id: {}", created["id"].as_str().unwrap_or("?"));
    Ok(())
}

fn do_sessions(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/sessions", server);
    let list: SessionList = parse(send(client()?.get(&url), &url), "sessions");

    if list.count == 0 {
        println!("No study sessions yet. Start one with `scholar-cli new`.");
        return Ok(());
    }
    for s in &list.sessions {
        println!("{}", session_line(s));
    }
    Ok(())
}

fn do_ask(server: &str, session: &str, question: &str) -> anyhow::Result<()> {
    if question.trim().is_empty() {
        eprintln!("Please enter a question before submitting.");
        std::process::exit(1);
    }

    let url = format!("{}/sessions/{}/ask", server, session);
    let body = serde_json::json!({ "question": question });
    let result: AskResult = parse(send(client()?.post(&url).json(&body), &url), "ask");

    if let Some(subject) = &result.subject {
        println!("Subject: {}\n", subject);
    }
    println!("{}\n", result.answer);
    println!("Exchange id: {}", result.exchange_id);
    Ok(())
}

fn do_history(server: &str, session: &str, full: bool) -> anyhow::Result<()> {
    let url = format!("{}/sessions/{}/exchanges", server, session);
    let history: History = parse(send(client()?.get(&url), &url), "history");

    if history.count == 0 {
        println!("No questions asked in this session yet.");
        return Ok(());
    }

    // Newest first
    for e in history.exchanges.iter().rev() {
        println!("{}", question_title(&e.question));
        println!("  id:      {}", e.id);
        println!("  asked:   {}", e.created_at);
        if let Some(subject) = &e.subject {
            println!("  subject: {}", subject);
        }
        println!("  {}", rating_label(e.rating.as_deref()));
        if let Some(feedback) = e.feedback.as_deref().filter(|f| !f.is_empty()) {
            println!("  feedback: {}", feedback);
        }
        if full {
            println!("\n  Question: {}\n  Answer: {}", e.question, e.answer);
        }
        println!();
    }
    Ok(())
}

fn do_rate(
    server: &str,
    exchange: &str,
    rating: RatingArg,
    feedback: Option<String>,
) -> anyhow::Result<()> {
    let url = format!("{}/exchanges/{}/rating", server, exchange);
    let body = serde_json::json!({ "rating": rating.as_str(), "feedback": feedback });
    send(client()?.post(&url).json(&body), &url);

    println!("{}", rating_label(Some(rating.as_str())));
    Ok(())
}

fn do_feedback(server: &str, exchange: &str, text: &str) -> anyhow::Result<()> {
    let url = format!("{}/exchanges/{}/feedback", server, exchange);
    let body = serde_json::json!({ "feedback": text });
    send(client()?.post(&url).json(&body), &url);

    println!("Feedback saved. Thank you!");
    Ok(())
}

fn do_delete(server: &str, session: &str) -> anyhow::Result<()> {
    let url = format!("{}/sessions/{}", server, session);
    send(client()?.delete(&url), &url);

    println!("Deleted study session {}", session);
    Ok(())
}

fn do_stats(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/stats", server);
    let stats: Stats = parse(send(client()?.get(&url), &url), "stats");

    for line in stats_lines(&stats) {
        println!("{}", line);
    }
    Ok(())
}

fn do_export(server: &str, session: &str, output: Option<String>, save: bool) -> anyhow::Result<()> {
    let url = format!("{}/sessions/{}/export", server, session);
    let resp = send(client()?.get(&url), &url);

    let suggested = resp
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(file_name_from_disposition);
    let text = resp.text()?;

    let target = match (output, save) {
        (Some(path), _) => Some(path),
        (None, true) => Some(suggested.unwrap_or_else(|| format!("study_session_{}.txt", session))),
        (None, false) => None,
    };

    match target {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Exported session notes to {}", path);
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Scholar server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:     {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Model:          {}", body["model"].as_str().unwrap_or("?"));
            println!("Socket:         {}", body["socket"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("scholar-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("scholar-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::New { name } => do_new(&server, name),
        Commands::Sessions => do_sessions(&server),
        Commands::Ask { session, question } => do_ask(&server, &session, &question),
        Commands::History { session, full } => do_history(&server, &session, full),
        Commands::Rate { exchange, rating, feedback } => do_rate(&server, &exchange, rating, feedback),
        Commands::Feedback { exchange, text } => do_feedback(&server, &exchange, &text),
        Commands::Delete { session } => do_delete(&server, &session),
        Commands::Stats => do_stats(&server),
        Commands::Export { session, output, save } => do_export(&server, &session, output, save),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("scholar-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_question_title_is_unchanged() {
        assert_eq!(question_title("What is a noun?"), "Q: What is a noun?");
    }

    #[test]
    fn test_long_question_title_truncated_to_60_chars() {
        let question = "a".repeat(61);
        let title = question_title(&question);
        assert_eq!(title, format!("Q: {}...", "a".repeat(60)));
    }

    #[test]
    fn test_exactly_60_chars_not_truncated() {
        let question = "b".repeat(60);
        assert_eq!(question_title(&question), format!("Q: {}", question));
    }

    #[test]
    fn test_title_truncation_counts_chars_not_bytes() {
        let question = "é".repeat(70);
        let title = question_title(&question);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), "Q: ".len() + 60 + 3);
    }

    #[test]
    fn test_session_line_shows_both_timestamps() {
        let list: SessionList = serde_json::from_value(serde_json::json!({
            "count": 1,
            "sessions": [{
                "id": "11111111-2222-3333-4444-555555555555",
                "name": "Algebra",
                "created_at": "2026-02-23T10:00:00Z",
                "updated_at": "2026-02-23T11:30:00Z"
            }]
        }))
        .unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(
            session_line(&list.sessions[0]),
            "11111111-2222-3333-4444-555555555555  Algebra  \
             (created 2026-02-23T10:00:00Z, updated 2026-02-23T11:30:00Z)"
        );
    }

    #[test]
    fn test_rating_labels() {
        assert_eq!(rating_label(Some("up")), "👍 Rated positively");
        assert_eq!(rating_label(Some("down")), "👎 Rated negatively");
        assert_eq!(rating_label(None), "Not rated");
    }

    #[test]
    fn test_stats_without_sessions() {
        let stats = Stats { total_sessions: 0, total_exchanges: 0, average_rating: None };
        assert_eq!(stats_lines(&stats), vec!["No study sessions yet".to_string()]);
    }

    #[test]
    fn test_stats_with_average() {
        let stats = Stats { total_sessions: 2, total_exchanges: 3, average_rating: Some(0.0) };
        let lines = stats_lines(&stats);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with('2'));
        assert!(lines[1].ends_with('3'));
        assert!(lines[2].ends_with("+0.00"));
    }

    #[test]
    fn test_stats_without_ratings_omits_average() {
        let stats = Stats { total_sessions: 1, total_exchanges: 4, average_rating: None };
        assert_eq!(stats_lines(&stats).len(), 2);
    }

    #[test]
    fn test_file_name_from_disposition() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"study_session_Math_Review.txt\""),
            Some("study_session_Math_Review.txt".to_string())
        );
        assert_eq!(file_name_from_disposition("attachment"), None);
        assert_eq!(file_name_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_history_response_parses() {
        let body = serde_json::json!({
            "session_id": "11111111-2222-3333-4444-555555555555",
            "count": 1,
            "exchanges": [{
                "id": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
                "session_id": "11111111-2222-3333-4444-555555555555",
                "question": "What is a verb?",
                "answer": "An action word.",
                "subject": "Language Arts",
                "rating": "up",
                "feedback": null,
                "created_at": "2026-02-23T10:00:00Z"
            }]
        });
        let history: History = serde_json::from_value(body).unwrap();
        assert_eq!(history.count, 1);
        assert_eq!(history.exchanges[0].subject.as_deref(), Some("Language Arts"));
        assert_eq!(history.exchanges[0].rating.as_deref(), Some("up"));
        assert!(history.exchanges[0].feedback.is_none());
    }

    #[test]
    fn test_cli_parses_rate_command() {
        let cli = Cli::try_parse_from([
            "scholar-cli",
            "rate",
            "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "down",
            "--feedback",
            "too vague",
        ])
        .unwrap();
        match cli.command {
            Commands::Rate { rating, feedback, .. } => {
                assert_eq!(rating, RatingArg::Down);
                assert_eq!(feedback.as_deref(), Some("too vague"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_numeric_rating() {
        let parsed = Cli::try_parse_from(["scholar-cli", "rate", "some-id", "5"]);
        assert!(parsed.is_err());
    }
}
