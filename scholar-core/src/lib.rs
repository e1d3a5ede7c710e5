pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ipc;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod store;

pub use classifier::{categorize_question, Subject};
pub use config::ScholarConfig;
pub use error::ScholarError;
pub use llm::{CompletionBackend, GeminiClient, LlmError};
pub use models::{ChatExchange, Rating, SessionStats, StudySession};
pub use store::{StoreError, StudyStore};
