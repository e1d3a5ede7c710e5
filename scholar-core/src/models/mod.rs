pub mod exchange;
pub mod session;
pub mod stats;

pub use exchange::{ChatExchange, Rating};
pub use session::StudySession;
pub use stats::SessionStats;
