use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardRow {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_board(
    pool: &DbPool,
    organization_id: i64,
    name: &str,
) -> Result<BoardRow, DbError> {
    let row = sqlx::query_as::<_, BoardRow>(
        "INSERT INTO boards (organization_id, name, created_at)
         VALUES ($1, $2, $3)
         RETURNING id, organization_id, name, created_at",
    )
    .bind(organization_id)
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_board(pool: &DbPool, board_id: i64) -> Result<Option<BoardRow>, DbError> {
    let row = sqlx::query_as::<_, BoardRow>(
        "SELECT id, organization_id, name, created_at FROM boards WHERE id = $1",
    )
    .bind(board_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn add_member(pool: &DbPool, board_id: i64, user_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO board_members (board_id, user_id, joined_at)
         VALUES ($1, $2, $3)
         ON CONFLICT DO NOTHING",
    )
    .bind(board_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_member(pool: &DbPool, board_id: i64, user_id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND user_id = $2")
        .bind(board_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn board_member_user_ids(pool: &DbPool, board_id: i64) -> Result<Vec<i64>, DbError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT user_id FROM board_members WHERE board_id = $1 ORDER BY user_id",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
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
    async fn test_board_membership_roundtrip() {
        let pool = test_pool().await;
        let org = crate::organizations::create_organization(&pool, "Org", None)
            .await
            .unwrap();
        let board = create_board(&pool, org.id, "Board").await.unwrap();
        let alice = crate::users::create_user(&pool, "alice", None)
            .await
            .unwrap();
        let bob = crate::users::create_user(&pool, "bob", None).await.unwrap();

        add_member(&pool, board.id, alice.id).await.unwrap();
        add_member(&pool, board.id, bob.id).await.unwrap();
        // duplicate add is a no-op
        add_member(&pool, board.id, alice.id).await.unwrap();

        let ids = board_member_user_ids(&pool, board.id).await.unwrap();
        assert_eq!(ids, vec![alice.id, bob.id]);

        remove_member(&pool, board.id, alice.id).await.unwrap();
        let ids = board_member_user_ids(&pool, board.id).await.unwrap();
        assert_eq!(ids, vec![bob.id]);
    }

    #[tokio::test]
    async fn test_get_board_not_found() {
        let pool = test_pool().await;
        assert!(get_board(&pool, 404).await.unwrap().is_none());
    }
}
