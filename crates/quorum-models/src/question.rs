use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answer::Answer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum QuestionType {
    SingleChoice = 0,
    MultipleChoice = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// 1-based presentation page.
    pub page: i64,
    /// 0-based position within the page.
    pub order: i64,
    pub question_type: QuestionType,
    pub created_at: DateTime<Utc>,
    /// Live (non-archived) answers, ordered by order.
    pub answers: Vec<Answer>,
}
