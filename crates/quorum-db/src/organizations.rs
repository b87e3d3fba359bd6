use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub const ORG_ROLE_ADMIN: &str = "admin";
pub const ORG_ROLE_MEMBER: &str = "member";
pub const ORG_STATUS_ACCEPTED: &str = "accepted";
pub const ORG_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRow {
    pub id: i64,
    pub name: String,
    pub parent_org_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub async fn create_organization(
    pool: &DbPool,
    name: &str,
    parent_org_id: Option<i64>,
) -> Result<OrganizationRow, DbError> {
    let row = sqlx::query_as::<_, OrganizationRow>(
        "INSERT INTO organizations (name, parent_org_id, created_at)
         VALUES ($1, $2, $3)
         RETURNING id, name, parent_org_id, created_at",
    )
    .bind(name)
    .bind(parent_org_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_organization(
    pool: &DbPool,
    org_id: i64,
) -> Result<Option<OrganizationRow>, DbError> {
    let row = sqlx::query_as::<_, OrganizationRow>(
        "SELECT id, name, parent_org_id, created_at FROM organizations WHERE id = $1",
    )
    .bind(org_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn add_member(
    pool: &DbPool,
    org_id: i64,
    user_id: i64,
    role: &str,
    status: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO organization_members (organization_id, user_id, role, status, joined_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (organization_id, user_id) DO UPDATE SET role = $3, status = $4",
    )
    .bind(org_id)
    .bind(user_id)
    .bind(role)
    .bind(status)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Accepted admin of this organization. Pending invitations carry no
/// privileges.
pub async fn is_user_admin(pool: &DbPool, user_id: i64, org_id: i64) -> Result<bool, DbError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM organization_members
         WHERE organization_id = $1 AND user_id = $2 AND role = $3 AND status = $4",
    )
    .bind(org_id)
    .bind(user_id)
    .bind(ORG_ROLE_ADMIN)
    .bind(ORG_STATUS_ACCEPTED)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn is_member(pool: &DbPool, user_id: i64, org_id: i64) -> Result<bool, DbError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM organization_members
         WHERE organization_id = $1 AND user_id = $2 AND status = $3",
    )
    .bind(org_id)
    .bind(user_id)
    .bind(ORG_STATUS_ACCEPTED)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Accepted member user ids of the organization and every descendant
/// organization, deduplicated.
pub async fn org_member_user_ids_including_descendants(
    pool: &DbPool,
    org_id: i64,
) -> Result<Vec<i64>, DbError> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "WITH RECURSIVE org_tree(id) AS (
             SELECT id FROM organizations WHERE id = $1
             UNION
             SELECT o.id FROM organizations o
             INNER JOIN org_tree t ON o.parent_org_id = t.id
         )
         SELECT DISTINCT m.user_id
         FROM organization_members m
         INNER JOIN org_tree t ON m.organization_id = t.id
         WHERE m.status = $2
         ORDER BY m.user_id",
    )
    .bind(org_id)
    .bind(ORG_STATUS_ACCEPTED)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
}
