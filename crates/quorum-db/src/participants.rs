use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub const SNAPSHOT_INITIAL_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub user_weight: f64,
    pub snapshot_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeightHistoryRow {
    pub id: i64,
    pub participant_id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub old_weight: f64,
    pub new_weight: f64,
    pub changed_by: i64,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

const PARTICIPANT_COLUMNS: &str = "id, poll_id, user_id, user_weight, snapshot_at";
const HISTORY_COLUMNS: &str =
    "id, participant_id, poll_id, user_id, old_weight, new_weight, changed_by, reason, changed_at";

/// One-shot snapshot: freeze the roster at weight 1.0, write the paired
/// audit rows, flip the snapshot flag (and optionally the active flag), all
/// in a single transaction. Each history row takes its participant id
/// straight from the insert's RETURNING clause.
pub async fn execute_activation(
    pool: &DbPool,
    poll_id: i64,
    user_ids: &[i64],
    taken_by: i64,
    activate: bool,
) -> Result<Vec<ParticipantRow>, DbError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let mut participants = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let participant = sqlx::query_as::<_, ParticipantRow>(
            "INSERT INTO poll_participants (poll_id, user_id, user_weight, snapshot_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, poll_id, user_id, user_weight, snapshot_at",
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(SNAPSHOT_INITIAL_WEIGHT)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO participant_weight_history
                 (participant_id, poll_id, user_id, old_weight, new_weight, changed_by, reason, changed_at)
             VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)",
        )
        .bind(participant.id)
        .bind(poll_id)
        .bind(user_id)
        .bind(0.0_f64)
        .bind(SNAPSHOT_INITIAL_WEIGHT)
        .bind(taken_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        participants.push(participant);
    }

    let result = if activate {
        sqlx::query("UPDATE polls SET participants_snapshot_taken = 1, active = 1 WHERE id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?
    } else {
        sqlx::query("UPDATE polls SET participants_snapshot_taken = 1 WHERE id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?
    };
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    tracing::info!(poll_id, participants = participants.len(), "participant snapshot taken");
    Ok(participants)
}

/// Reversal of the snapshot while no votes exist: drop the roster and clear
/// the flag. History rows stay, the audit trail is append-only.
pub async fn discard_snapshot(pool: &DbPool, poll_id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM poll_participants WHERE poll_id = $1")
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("UPDATE polls SET participants_snapshot_taken = 0 WHERE id = $1")
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_participant(
    pool: &DbPool,
    participant_id: i64,
) -> Result<Option<ParticipantRow>, DbError> {
    let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM poll_participants WHERE id = $1");
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(participant_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_participant(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<Option<ParticipantRow>, DbError> {
    let sql = format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM poll_participants WHERE poll_id = $1 AND user_id = $2"
    );
    let row = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn poll_participants(
    pool: &DbPool,
    poll_id: i64,
) -> Result<Vec<ParticipantRow>, DbError> {
    let sql = format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM poll_participants WHERE poll_id = $1 ORDER BY user_id"
    );
    let rows = sqlx::query_as::<_, ParticipantRow>(&sql)
        .bind(poll_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Eligible weight: the sum over every participant, voters or not.
pub async fn total_weight(pool: &DbPool, poll_id: i64) -> Result<f64, DbError> {
    let row: (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(user_weight), 0.0) FROM poll_participants WHERE poll_id = $1",
    )
    .bind(poll_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Weight mutation and its audit row commit together. `old_weight` is the
/// value read inside the same transaction.
pub async fn update_weight(
    pool: &DbPool,
    participant_id: i64,
    new_weight: f64,
    changed_by: i64,
    reason: Option<&str>,
) -> Result<ParticipantRow, DbError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let current: Option<(f64,)> =
        sqlx::query_as("SELECT user_weight FROM poll_participants WHERE id = $1")
            .bind(participant_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (old_weight,) = current.ok_or(DbError::NotFound)?;

    let updated = sqlx::query_as::<_, ParticipantRow>(
        "UPDATE poll_participants SET user_weight = $2
         WHERE id = $1
         RETURNING id, poll_id, user_id, user_weight, snapshot_at",
    )
    .bind(participant_id)
    .bind(new_weight)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO participant_weight_history
             (participant_id, poll_id, user_id, old_weight, new_weight, changed_by, reason, changed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(participant_id)
    .bind(updated.poll_id)
    .bind(updated.user_id)
    .bind(old_weight)
    .bind(new_weight)
    .bind(changed_by)
    .bind(reason)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

pub async fn remove_participant(pool: &DbPool, participant_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM poll_participants WHERE id = $1")
        .bind(participant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Full audit trail for a poll, oldest first.
pub async fn weight_history(pool: &DbPool, poll_id: i64) -> Result<Vec<WeightHistoryRow>, DbError> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM participant_weight_history
         WHERE poll_id = $1 ORDER BY changed_at, id"
    );
    let rows = sqlx::query_as::<_, WeightHistoryRow>(&sql)
        .bind(poll_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quorum_models::PollScope;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    struct Fixture {
        poll_id: i64,
        admin_id: i64,
        voter_ids: Vec<i64>,
    }

    async fn setup(pool: &DbPool, voters: usize) -> Fixture {
        let org = crate::organizations::create_organization(pool, "Org", None)
            .await
            .unwrap();
        let board = crate::boards::create_board(pool, org.id, "Board")
            .await
            .unwrap();
        let admin = crate::users::create_user(pool, "admin", None).await.unwrap();
        let poll = crate::polls::create_poll(
            pool,
            board.id,
            "T",
            "D",
            PollScope::Board,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap(),
            None,
            admin.id,
        )
        .await
        .unwrap();
        let mut voter_ids = Vec::new();
        for i in 0..voters {
            let user = crate::users::create_user(pool, &format!("voter{i}"), None)
                .await
                .unwrap();
            voter_ids.push(user.id);
        }
        Fixture {
            poll_id: poll.id,
            admin_id: admin.id,
            voter_ids,
        }
    }

    #[tokio::test]
    async fn test_execute_activation_creates_participants_and_history() {
        let pool = test_pool().await;
        let fx = setup(&pool, 3).await;

        let participants =
            execute_activation(&pool, fx.poll_id, &fx.voter_ids, fx.admin_id, true)
                .await
                .unwrap();
        assert_eq!(participants.len(), 3);
        for p in &participants {
            assert_eq!(p.user_weight, SNAPSHOT_INITIAL_WEIGHT);
        }

        let history = weight_history(&pool, fx.poll_id).await.unwrap();
        assert_eq!(history.len(), 3);
        for (p, h) in participants.iter().zip(&history) {
            assert_eq!(h.participant_id, p.id);
            assert_eq!(h.old_weight, 0.0);
            assert_eq!(h.new_weight, SNAPSHOT_INITIAL_WEIGHT);
            assert_eq!(h.changed_by, fx.admin_id);
            assert!(h.reason.is_none());
        }

        let poll = crate::polls::get_poll(&pool, fx.poll_id).await.unwrap().unwrap();
        assert!(poll.participants_snapshot_taken);
        assert!(poll.active);
    }

    #[tokio::test]
    async fn test_execute_activation_without_activate_leaves_poll_inactive() {
        let pool = test_pool().await;
        let fx = setup(&pool, 1).await;
        execute_activation(&pool, fx.poll_id, &fx.voter_ids, fx.admin_id, false)
            .await
            .unwrap();
        let poll = crate::polls::get_poll(&pool, fx.poll_id).await.unwrap().unwrap();
        assert!(poll.participants_snapshot_taken);
        assert!(!poll.active);
    }

    #[tokio::test]
    async fn test_execute_activation_is_atomic_on_duplicate_user() {
        let pool = test_pool().await;
        let fx = setup(&pool, 2).await;
        // duplicate id violates UNIQUE (poll_id, user_id); nothing must stick
        let ids = vec![fx.voter_ids[0], fx.voter_ids[1], fx.voter_ids[0]];
        assert!(execute_activation(&pool, fx.poll_id, &ids, fx.admin_id, true)
            .await
            .is_err());

        assert!(poll_participants(&pool, fx.poll_id).await.unwrap().is_empty());
        assert!(weight_history(&pool, fx.poll_id).await.unwrap().is_empty());
        let poll = crate::polls::get_poll(&pool, fx.poll_id).await.unwrap().unwrap();
        assert!(!poll.participants_snapshot_taken);
        assert!(!poll.active);
    }

    #[tokio::test]
    async fn test_update_weight_records_old_weight() {
        let pool = test_pool().await;
        let fx = setup(&pool, 1).await;
        let participants =
            execute_activation(&pool, fx.poll_id, &fx.voter_ids, fx.admin_id, false)
                .await
                .unwrap();
        let participant = &participants[0];

        let updated = update_weight(&pool, participant.id, 2.5, fx.admin_id, Some("board seat"))
            .await
            .unwrap();
        assert_eq!(updated.user_weight, 2.5);

        let updated = update_weight(&pool, participant.id, 0.5, fx.admin_id, None)
            .await
            .unwrap();
        assert_eq!(updated.user_weight, 0.5);

        let history = weight_history(&pool, fx.poll_id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].old_weight, 0.0);
        assert_eq!(history[1].old_weight, SNAPSHOT_INITIAL_WEIGHT);
        assert_eq!(history[1].new_weight, 2.5);
        assert_eq!(history[1].reason.as_deref(), Some("board seat"));
        assert_eq!(history[2].old_weight, 2.5);
        assert_eq!(history[2].new_weight, 0.5);
    }

    #[tokio::test]
    async fn test_update_weight_missing_participant() {
        let pool = test_pool().await;
        assert!(matches!(
            update_weight(&pool, 404, 1.0, 1, None).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_discard_snapshot_keeps_history() {
        let pool = test_pool().await;
        let fx = setup(&pool, 2).await;
        execute_activation(&pool, fx.poll_id, &fx.voter_ids, fx.admin_id, false)
            .await
            .unwrap();

        discard_snapshot(&pool, fx.poll_id).await.unwrap();

        assert!(poll_participants(&pool, fx.poll_id).await.unwrap().is_empty());
        assert_eq!(weight_history(&pool, fx.poll_id).await.unwrap().len(), 2);
        let poll = crate::polls::get_poll(&pool, fx.poll_id).await.unwrap().unwrap();
        assert!(!poll.participants_snapshot_taken);
    }

    #[tokio::test]
    async fn test_total_weight_sums_all_participants() {
        let pool = test_pool().await;
        let fx = setup(&pool, 3).await;
        let participants =
            execute_activation(&pool, fx.poll_id, &fx.voter_ids, fx.admin_id, false)
                .await
                .unwrap();
        update_weight(&pool, participants[0].id, 2.0, fx.admin_id, None)
            .await
            .unwrap();
        assert_eq!(total_weight(&pool, fx.poll_id).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_total_weight_empty_poll_is_zero() {
        let pool = test_pool().await;
        let fx = setup(&pool, 0).await;
        assert_eq!(total_weight(&pool, fx.poll_id).await.unwrap(), 0.0);
    }
}
