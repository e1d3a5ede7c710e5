use serde::{Deserialize, Serialize};

/// Aggregate counters across every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: i64,
    pub total_exchanges: i64,
    /// Mean of all recorded ratings to two decimals; `None` until something is rated.
    pub average_rating: Option<f64>,
}
