use serde::{Deserialize, Serialize};

use crate::question::QuestionType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: i64,
    /// Sum of every participant's weight, voters or not. Denominator for
    /// all percentages.
    pub total_participant_weight: f64,
    pub can_view_voters: bool,
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub text: String,
    pub question_type: QuestionType,
    pub page: i64,
    pub order: i64,
    pub answers: Vec<AnswerResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer_id: i64,
    pub text: String,
    pub order: i64,
    pub vote_count: i64,
    pub total_weight: f64,
    /// total_weight / total_participant_weight * 100, or 0 when the
    /// denominator is 0.
    pub percentage: f64,
    /// Present only when the viewer may see the voter breakdown.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub voters: Vec<AnswerVoter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerVoter {
    pub user_id: i64,
    pub name: String,
    pub weight: f64,
}
