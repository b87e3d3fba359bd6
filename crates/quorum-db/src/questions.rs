use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use quorum_models::QuestionType;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub details: Option<String>,
    pub page: i64,
    pub ord: i64,
    pub question_type: QuestionType,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl QuestionRow {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

const QUESTION_COLUMNS: &str =
    "id, poll_id, text, details, page, ord, question_type, created_at, archived_at";

pub async fn create_question(
    pool: &DbPool,
    poll_id: i64,
    text: &str,
    details: Option<&str>,
    page: i64,
    ord: i64,
    question_type: QuestionType,
) -> Result<QuestionRow, DbError> {
    let sql = format!(
        "INSERT INTO questions (poll_id, text, details, page, ord, question_type, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {QUESTION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, QuestionRow>(&sql)
        .bind(poll_id)
        .bind(text)
        .bind(details)
        .bind(page)
        .bind(ord)
        .bind(question_type)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_question(pool: &DbPool, question_id: i64) -> Result<Option<QuestionRow>, DbError> {
    let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
    let row = sqlx::query_as::<_, QuestionRow>(&sql)
        .bind(question_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn update_question(
    pool: &DbPool,
    question_id: i64,
    text: Option<&str>,
    details: Option<&str>,
    page: Option<i64>,
    ord: Option<i64>,
) -> Result<QuestionRow, DbError> {
    let sql = format!(
        "UPDATE questions SET text = COALESCE($2, text),
                              details = COALESCE($3, details),
                              page = COALESCE($4, page),
                              ord = COALESCE($5, ord)
         WHERE id = $1
         RETURNING {QUESTION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, QuestionRow>(&sql)
        .bind(question_id)
        .bind(text)
        .bind(details)
        .bind(page)
        .bind(ord)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Soft delete. The question's answers disappear from live views through
/// the question itself; their rows are untouched.
pub async fn archive_question(pool: &DbPool, question_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE questions SET archived_at = $2 WHERE id = $1")
        .bind(question_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Non-archived questions in presentation order.
pub async fn live_questions(pool: &DbPool, poll_id: i64) -> Result<Vec<QuestionRow>, DbError> {
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions
         WHERE poll_id = $1 AND archived_at IS NULL
         ORDER BY page, ord, id"
    );
    let rows = sqlx::query_as::<_, QuestionRow>(&sql)
        .bind(poll_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn live_question_count(pool: &DbPool, poll_id: i64) -> Result<i64, DbError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM questions WHERE poll_id = $1 AND archived_at IS NULL",
    )
    .bind(poll_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// (question id, live answer count) for every live question of the poll.
/// Backs the activation guard.
pub async fn live_answer_counts(pool: &DbPool, poll_id: i64) -> Result<Vec<(i64, i64)>, DbError> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT q.id, COUNT(a.id)
         FROM questions q
         LEFT JOIN answers a ON a.question_id = q.id AND a.archived_at IS NULL
         WHERE q.poll_id = $1 AND q.archived_at IS NULL
         GROUP BY q.id
         ORDER BY q.page, q.ord, q.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
