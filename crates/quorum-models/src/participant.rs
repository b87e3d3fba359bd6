use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub name: String,
    pub user_weight: f64,
    pub snapshot_at: DateTime<Utc>,
}

/// One append-only audit record per weight mutation, including the initial
/// snapshot assignment (old_weight = 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryEntry {
    pub id: i64,
    pub participant_id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub old_weight: f64,
    pub new_weight: f64,
    pub changed_by: i64,
    pub changed_by_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}
