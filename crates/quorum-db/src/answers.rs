use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub ord: i64,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl AnswerRow {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

const ANSWER_COLUMNS: &str = "id, question_id, text, ord, created_at, archived_at";

pub async fn create_answer(
    pool: &DbPool,
    question_id: i64,
    text: &str,
    ord: i64,
) -> Result<AnswerRow, DbError> {
    let sql = format!(
        "INSERT INTO answers (question_id, text, ord, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {ANSWER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AnswerRow>(&sql)
        .bind(question_id)
        .bind(text)
        .bind(ord)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_answer(pool: &DbPool, answer_id: i64) -> Result<Option<AnswerRow>, DbError> {
    let sql = format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1");
    let row = sqlx::query_as::<_, AnswerRow>(&sql)
        .bind(answer_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update_answer(
    pool: &DbPool,
    answer_id: i64,
    text: Option<&str>,
    ord: Option<i64>,
) -> Result<AnswerRow, DbError> {
    let sql = format!(
        "UPDATE answers SET text = COALESCE($2, text), ord = COALESCE($3, ord)
         WHERE id = $1
         RETURNING {ANSWER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, AnswerRow>(&sql)
        .bind(answer_id)
        .bind(text)
        .bind(ord)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn archive_answer(pool: &DbPool, answer_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE answers SET archived_at = $2 WHERE id = $1")
        .bind(answer_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Non-archived answers of a question in presentation order.
pub async fn live_answers(pool: &DbPool, question_id: i64) -> Result<Vec<AnswerRow>, DbError> {
    let sql = format!(
        "SELECT {ANSWER_COLUMNS} FROM answers
         WHERE question_id = $1 AND archived_at IS NULL
         ORDER BY ord, id"
    );
    let rows = sqlx::query_as::<_, AnswerRow>(&sql)
        .bind(question_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Live answers for every live question of a poll, one query for read-model
/// assembly.
pub async fn live_poll_answers(pool: &DbPool, poll_id: i64) -> Result<Vec<AnswerRow>, DbError> {
    let rows = sqlx::query_as::<_, AnswerRow>(
        "SELECT a.id, a.question_id, a.text, a.ord, a.created_at, a.archived_at
         FROM answers a
         INNER JOIN questions q ON q.id = a.question_id
         WHERE q.poll_id = $1 AND q.archived_at IS NULL AND a.archived_at IS NULL
         ORDER BY a.question_id, a.ord, a.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
