use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DraftRow {
    pub id: i64,
    pub poll_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DRAFT_COLUMNS: &str = "id, poll_id, question_id, answer_id, user_id, created_at, updated_at";

/// Multiple-choice path: selections accumulate, re-selecting the same
/// answer just refreshes its timestamp.
pub async fn upsert_draft(
    pool: &DbPool,
    poll_id: i64,
    question_id: i64,
    answer_id: i64,
    user_id: i64,
) -> Result<DraftRow, DbError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO vote_drafts (poll_id, question_id, answer_id, user_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         ON CONFLICT (question_id, answer_id, user_id)
             DO UPDATE SET updated_at = excluded.updated_at
         RETURNING {DRAFT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DraftRow>(&sql)
        .bind(poll_id)
        .bind(question_id)
        .bind(answer_id)
        .bind(user_id)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Single-choice path: drop whatever the user had for this question, then
/// insert the one draft, atomically.
pub async fn replace_question_draft(
    pool: &DbPool,
    poll_id: i64,
    question_id: i64,
    answer_id: i64,
    user_id: i64,
) -> Result<DraftRow, DbError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM vote_drafts WHERE question_id = $1 AND user_id = $2")
        .bind(question_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let sql = format!(
        "INSERT INTO vote_drafts (poll_id, question_id, answer_id, user_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $5)
         RETURNING {DRAFT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DraftRow>(&sql)
        .bind(poll_id)
        .bind(question_id)
        .bind(answer_id)
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(row)
}

/// Toggle-style removal. Returns how many rows went away (0 or 1).
pub async fn delete_draft(
    pool: &DbPool,
    question_id: i64,
    answer_id: i64,
    user_id: i64,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM vote_drafts WHERE question_id = $1 AND answer_id = $2 AND user_id = $3",
    )
    .bind(question_id)
    .bind(answer_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn user_poll_drafts(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<Vec<DraftRow>, DbError> {
    let sql = format!(
        "SELECT {DRAFT_COLUMNS} FROM vote_drafts
         WHERE poll_id = $1 AND user_id = $2
         ORDER BY question_id, answer_id"
    );
    let rows = sqlx::query_as::<_, DraftRow>(&sql)
        .bind(poll_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Post-finish cleanup across every user of the poll.
pub async fn delete_poll_drafts(pool: &DbPool, poll_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM vote_drafts WHERE poll_id = $1")
        .bind(poll_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_upsert_draft_accumulates_per_answer() {
        let pool = test_pool().await;
        upsert_draft(&pool, 1, 10, 100, 7).await.unwrap();
        upsert_draft(&pool, 1, 10, 101, 7).await.unwrap();
        // same answer again: refresh, not duplicate
        upsert_draft(&pool, 1, 10, 100, 7).await.unwrap();

        let drafts = user_poll_drafts(&pool, 1, 7).await.unwrap();
        assert_eq!(drafts.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_question_draft_keeps_one() {
        let pool = test_pool().await;
        replace_question_draft(&pool, 1, 10, 100, 7).await.unwrap();
        replace_question_draft(&pool, 1, 10, 101, 7).await.unwrap();

        let drafts = user_poll_drafts(&pool, 1, 7).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].answer_id, 101);
    }

    #[tokio::test]
    async fn test_replace_does_not_touch_other_users_or_questions() {
        let pool = test_pool().await;
        replace_question_draft(&pool, 1, 10, 100, 7).await.unwrap();
        replace_question_draft(&pool, 1, 11, 110, 7).await.unwrap();
        replace_question_draft(&pool, 1, 10, 100, 8).await.unwrap();

        replace_question_draft(&pool, 1, 10, 101, 7).await.unwrap();

        assert_eq!(user_poll_drafts(&pool, 1, 7).await.unwrap().len(), 2);
        assert_eq!(user_poll_drafts(&pool, 1, 8).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_draft_is_exact_and_idempotent() {
        let pool = test_pool().await;
        upsert_draft(&pool, 1, 10, 100, 7).await.unwrap();
        upsert_draft(&pool, 1, 10, 101, 7).await.unwrap();

        assert_eq!(delete_draft(&pool, 10, 100, 7).await.unwrap(), 1);
        assert_eq!(delete_draft(&pool, 10, 100, 7).await.unwrap(), 0);
        let drafts = user_poll_drafts(&pool, 1, 7).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].answer_id, 101);
    }

    #[tokio::test]
    async fn test_delete_poll_drafts_spans_users() {
        let pool = test_pool().await;
        upsert_draft(&pool, 1, 10, 100, 7).await.unwrap();
        upsert_draft(&pool, 1, 10, 100, 8).await.unwrap();
        upsert_draft(&pool, 2, 20, 200, 7).await.unwrap();

        assert_eq!(delete_poll_drafts(&pool, 1).await.unwrap(), 2);
        assert!(user_poll_drafts(&pool, 1, 7).await.unwrap().is_empty());
        assert_eq!(user_poll_drafts(&pool, 2, 7).await.unwrap().len(), 1);
    }
}
