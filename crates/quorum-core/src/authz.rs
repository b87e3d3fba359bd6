use crate::error::CoreError;
use quorum_db::polls::PollRow;
use quorum_db::DbPool;

/// Organization that owns the poll's board.
pub async fn poll_org_id(pool: &DbPool, poll: &PollRow) -> Result<i64, CoreError> {
    let board = quorum_db::boards::get_board(pool, poll.board_id)
        .await?
        .ok_or(CoreError::BoardNotFound)?;
    Ok(board.organization_id)
}

/// Admin standing: accepted organization admin or superadmin.
pub async fn is_org_admin(pool: &DbPool, user_id: i64, org_id: i64) -> Result<bool, CoreError> {
    if quorum_db::users::is_superadmin(pool, user_id).await? {
        return Ok(true);
    }
    Ok(quorum_db::organizations::is_user_admin(pool, user_id, org_id).await?)
}

pub async fn ensure_org_admin(pool: &DbPool, user_id: i64, org_id: i64) -> Result<(), CoreError> {
    if !is_org_admin(pool, user_id, org_id).await? {
        return Err(CoreError::NotAuthorized);
    }
    Ok(())
}

/// Admin standing for poll administration. Being the poll's creator grants
/// nothing on its own.
pub async fn is_poll_admin(pool: &DbPool, poll: &PollRow, user_id: i64) -> Result<bool, CoreError> {
    let org_id = poll_org_id(pool, poll).await?;
    is_org_admin(pool, user_id, org_id).await
}

pub async fn ensure_poll_admin(
    pool: &DbPool,
    poll: &PollRow,
    user_id: i64,
) -> Result<(), CoreError> {
    if !is_poll_admin(pool, poll, user_id).await? {
        return Err(CoreError::NotAuthorized);
    }
    Ok(())
}

/// Accepted membership in the board's organization, with superadmins
/// passing implicitly. Backs structure reads and finished-poll results.
pub async fn is_poll_org_member(
    pool: &DbPool,
    poll: &PollRow,
    user_id: i64,
) -> Result<bool, CoreError> {
    if quorum_db::users::is_superadmin(pool, user_id).await? {
        return Ok(true);
    }
    let org_id = poll_org_id(pool, poll).await?;
    Ok(quorum_db::organizations::is_member(pool, user_id, org_id).await?)
}
