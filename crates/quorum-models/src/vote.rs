use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provisional ballot selection. Freely replaced or removed until the
/// voter commits, never read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteDraft {
    pub id: i64,
    pub poll_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable committed ballot. `user_weight` is the participant's weight
/// at commit time and is never re-read from the participant afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    pub user_weight: f64,
    pub created_at: DateTime<Utc>,
}
