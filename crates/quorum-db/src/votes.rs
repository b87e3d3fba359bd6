use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub user_id: i64,
    pub user_weight: f64,
    pub created_at: DateTime<Utc>,
}

const VOTE_COLUMNS: &str = "id, question_id, answer_id, user_id, user_weight, created_at";

/// The per-user commit: the whole vote batch lands and the user's drafts
/// for the poll vanish in one transaction. A concurrent reader never sees
/// votes without the drafts cleared or the other way round.
pub async fn commit_votes_and_clear_drafts(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
    user_weight: f64,
    selections: &[(i64, i64)],
) -> Result<Vec<VoteRow>, DbError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO votes (question_id, answer_id, user_id, user_weight, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {VOTE_COLUMNS}"
    );
    let mut votes = Vec::with_capacity(selections.len());
    for (question_id, answer_id) in selections {
        let vote = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(question_id)
            .bind(answer_id)
            .bind(user_id)
            .bind(user_weight)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
        votes.push(vote);
    }

    sqlx::query("DELETE FROM vote_drafts WHERE poll_id = $1 AND user_id = $2")
        .bind(poll_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(poll_id, user_id, votes = votes.len(), "votes committed");
    Ok(votes)
}

/// Every vote cast in the poll, archived questions included; the tally
/// filters.
pub async fn poll_votes(pool: &DbPool, poll_id: i64) -> Result<Vec<VoteRow>, DbError> {
    let rows = sqlx::query_as::<_, VoteRow>(
        "SELECT v.id, v.question_id, v.answer_id, v.user_id, v.user_weight, v.created_at
         FROM votes v
         INNER JOIN questions q ON q.id = v.question_id
         WHERE q.poll_id = $1
         ORDER BY v.question_id, v.answer_id, v.user_id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Consistency guard: once this turns true, participants and weights are
/// frozen for good.
pub async fn poll_has_votes(pool: &DbPool, poll_id: i64) -> Result<bool, DbError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM votes v
         INNER JOIN questions q ON q.id = v.question_id
         WHERE q.poll_id = $1
         LIMIT 1",
    )
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// How many distinct live questions the user has cast votes for. Equal to
/// the poll's live question count exactly when the user finished voting.
pub async fn distinct_answered_live_question_count(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<i64, DbError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT v.question_id)
         FROM votes v
         INNER JOIN questions q ON q.id = v.question_id
         WHERE q.poll_id = $1 AND q.archived_at IS NULL AND v.user_id = $2",
    )
    .bind(poll_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
