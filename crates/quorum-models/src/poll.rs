use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::question::Question;

/// Who gets frozen into the participant snapshot when the poll activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum PollScope {
    /// Current members of the owning board.
    Board = 0,
    /// Accepted members of the board's organization and all descendant
    /// organizations, deduplicated by user id.
    Organization = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    pub description: String,
    pub scope: PollScope,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    pub finished: bool,
    pub participants_snapshot_taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_criteria: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    /// Live (non-archived) questions, ordered by page then order.
    pub questions: Vec<Question>,
}
