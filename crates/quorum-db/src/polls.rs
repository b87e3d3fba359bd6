use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use quorum_models::PollScope;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
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
    pub weight_criteria: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

const POLL_COLUMNS: &str = "id, board_id, title, description, scope, start_date, end_date, \
                            active, finished, participants_snapshot_taken, weight_criteria, \
                            created_by, created_at, archived_at";

#[allow(clippy::too_many_arguments)]
pub async fn create_poll(
    pool: &DbPool,
    board_id: i64,
    title: &str,
    description: &str,
    scope: PollScope,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    weight_criteria: Option<&str>,
    created_by: i64,
) -> Result<PollRow, DbError> {
    let sql = format!(
        "INSERT INTO polls (board_id, title, description, scope, start_date, end_date, weight_criteria, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {POLL_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PollRow>(&sql)
        .bind(board_id)
        .bind(title)
        .bind(description)
        .bind(scope)
        .bind(start_date)
        .bind(end_date)
        .bind(weight_criteria)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_poll(pool: &DbPool, poll_id: i64) -> Result<Option<PollRow>, DbError> {
    let sql = format!("SELECT {POLL_COLUMNS} FROM polls WHERE id = $1");
    let row = sqlx::query_as::<_, PollRow>(&sql)
        .bind(poll_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Non-archived polls of a board, newest first.
pub async fn list_board_polls(pool: &DbPool, board_id: i64) -> Result<Vec<PollRow>, DbError> {
    let sql = format!(
        "SELECT {POLL_COLUMNS} FROM polls
         WHERE board_id = $1 AND archived_at IS NULL
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, PollRow>(&sql)
        .bind(board_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn update_poll(
    pool: &DbPool,
    poll_id: i64,
    title: Option<&str>,
    description: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    weight_criteria: Option<&str>,
) -> Result<PollRow, DbError> {
    let sql = format!(
        "UPDATE polls SET title = COALESCE($2, title),
                          description = COALESCE($3, description),
                          start_date = COALESCE($4, start_date),
                          end_date = COALESCE($5, end_date),
                          weight_criteria = COALESCE($6, weight_criteria)
         WHERE id = $1
         RETURNING {POLL_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PollRow>(&sql)
        .bind(poll_id)
        .bind(title)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .bind(weight_criteria)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn set_active(pool: &DbPool, poll_id: i64, active: bool) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE polls SET active = $2 WHERE id = $1")
        .bind(poll_id)
        .bind(active)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Terminal transition: finished polls are never active.
pub async fn set_finished(pool: &DbPool, poll_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE polls SET finished = 1, active = 0 WHERE id = $1")
        .bind(poll_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn set_archived(
    pool: &DbPool,
    poll_id: i64,
    archived_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE polls SET archived_at = $2 WHERE id = $1")
        .bind(poll_id)
        .bind(archived_at)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
