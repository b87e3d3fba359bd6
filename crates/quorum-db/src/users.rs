use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub superadmin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Name shown in results and history: display name, falling back to
    /// the username.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

pub async fn create_user(
    pool: &DbPool,
    username: &str,
    display_name: Option<&str>,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, display_name, created_at)
         VALUES ($1, $2, $3)
         RETURNING id, username, display_name, superadmin, created_at",
    )
    .bind(username)
    .bind(display_name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, display_name, superadmin, created_at
         FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn set_superadmin(
    pool: &DbPool,
    user_id: i64,
    superadmin: bool,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE users SET superadmin = $2 WHERE id = $1")
        .bind(user_id)
        .bind(superadmin)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub async fn is_superadmin(pool: &DbPool, user_id: i64) -> Result<bool, DbError> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT superadmin FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(flag,)| flag).unwrap_or(false))
}

/// Display names keyed by user id, for presenting results and the weight
/// audit trail. Ids without a user row are simply absent.
pub async fn display_names(
    pool: &DbPool,
    user_ids: &[i64],
) -> Result<HashMap<i64, String>, DbError> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = (1..=user_ids.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, username, display_name FROM users WHERE id IN ({placeholders})"
    );
    let mut query = sqlx::query_as::<_, (i64, String, Option<String>)>(&sql);
    for id in user_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(id, username, display_name)| (id, display_name.unwrap_or(username)))
        .collect())
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
    async fn test_create_and_get_user() {
        let pool = test_pool().await;
        let user = create_user(&pool, "alice", Some("Alice A.")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.name(), "Alice A.");
        assert!(!user.superadmin);

        let fetched = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let pool = test_pool().await;
        create_user(&pool, "alice", None).await.unwrap();
        assert!(create_user(&pool, "alice", None).await.is_err());
    }

    #[tokio::test]
    async fn test_superadmin_flag() {
        let pool = test_pool().await;
        let user = create_user(&pool, "root", None).await.unwrap();
        assert!(!is_superadmin(&pool, user.id).await.unwrap());
        set_superadmin(&pool, user.id, true).await.unwrap();
        assert!(is_superadmin(&pool, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_superadmin_unknown_user_is_false() {
        let pool = test_pool().await;
        assert!(!is_superadmin(&pool, 999).await.unwrap());
    }

    #[tokio::test]
    async fn test_display_names_fall_back_to_username() {
        let pool = test_pool().await;
        let a = create_user(&pool, "alice", Some("Alice A.")).await.unwrap();
        let b = create_user(&pool, "bob", None).await.unwrap();
        let names = display_names(&pool, &[a.id, b.id, 999]).await.unwrap();
        assert_eq!(names.get(&a.id).map(String::as_str), Some("Alice A."));
        assert_eq!(names.get(&b.id).map(String::as_str), Some("bob"));
        assert!(!names.contains_key(&999));
    }
}
