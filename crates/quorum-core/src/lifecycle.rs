use crate::authz;
use crate::error::CoreError;
use crate::snapshot;
use chrono::Utc;
use quorum_db::polls::PollRow;
use quorum_db::DbPool;

/// Closed lifecycle union. Draft and Ready differ only in whether the
/// participant roster is frozen; Finished is terminal. The archival flag is
/// orthogonal and lives on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Draft,
    Ready,
    Active,
    Finished,
}

impl PollState {
    pub fn of(poll: &PollRow) -> Self {
        if poll.finished {
            PollState::Finished
        } else if poll.active {
            PollState::Active
        } else if poll.participants_snapshot_taken {
            PollState::Ready
        } else {
            PollState::Draft
        }
    }

    pub fn activate(self) -> Result<PollState, CoreError> {
        match self {
            PollState::Finished => Err(CoreError::CannotActivateFinished),
            PollState::Active => Err(CoreError::PollAlreadyActive),
            PollState::Draft | PollState::Ready => Ok(PollState::Active),
        }
    }

    pub fn deactivate(self) -> Result<PollState, CoreError> {
        match self {
            PollState::Finished => Err(CoreError::PollFinished),
            PollState::Active => Ok(PollState::Ready),
            PollState::Draft | PollState::Ready => Err(CoreError::PollNotActive),
        }
    }

    pub fn finish(self) -> Result<PollState, CoreError> {
        match self {
            PollState::Finished => Err(CoreError::PollAlreadyFinished),
            PollState::Active => Ok(PollState::Finished),
            PollState::Draft | PollState::Ready => Err(CoreError::PollNotActive),
        }
    }

    /// (active, finished) as persisted. Finished is never active.
    pub fn flags(self) -> (bool, bool) {
        match self {
            PollState::Draft | PollState::Ready => (false, false),
            PollState::Active => (true, false),
            PollState::Finished => (false, true),
        }
    }
}

/// Activate a poll for voting. On the first activation this freezes the
/// participant roster atomically with the flag flip; later activations only
/// flip the flag.
pub async fn activate_poll(pool: &DbPool, poll_id: i64, actor: i64) -> Result<PollRow, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    PollState::of(&poll).activate()?;

    let answer_counts = quorum_db::questions::live_answer_counts(pool, poll.id).await?;
    if answer_counts.is_empty() {
        return Err(CoreError::PollNoQuestions);
    }
    if let Some((question_id, _)) = answer_counts.iter().find(|(_, count)| *count == 0) {
        return Err(CoreError::PollQuestionNoAnswers(*question_id));
    }

    if poll.participants_snapshot_taken {
        quorum_db::polls::set_active(pool, poll.id, true).await?;
    } else {
        let user_ids = snapshot::snapshot_user_ids(pool, &poll).await?;
        quorum_db::participants::execute_activation(pool, poll.id, &user_ids, actor, true).await?;
    }

    tracing::info!(poll_id = poll.id, actor, "poll activated");
    let row = quorum_db::polls::get_poll(pool, poll.id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    Ok(row)
}

pub async fn deactivate_poll(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
) -> Result<PollRow, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    let state = PollState::of(&poll).deactivate()?;

    let (active, _) = state.flags();
    quorum_db::polls::set_active(pool, poll.id, active).await?;
    tracing::info!(poll_id = poll.id, actor, "poll deactivated");
    let row = quorum_db::polls::get_poll(pool, poll.id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    Ok(row)
}

/// Terminal transition. Outstanding drafts across all users are deleted
/// best-effort afterwards: the transition has already committed, so a
/// cleanup failure is logged, not returned.
pub async fn finish_poll(pool: &DbPool, poll_id: i64, actor: i64) -> Result<PollRow, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    PollState::of(&poll).finish()?;

    quorum_db::polls::set_finished(pool, poll.id).await?;
    tracing::info!(poll_id = poll.id, actor, "poll finished");

    match quorum_db::vote_drafts::delete_poll_drafts(pool, poll.id).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(poll_id = poll.id, deleted, "leftover drafts removed");
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(poll_id = poll.id, error = %err, "failed to remove leftover drafts");
        }
    }

    let row = quorum_db::polls::get_poll(pool, poll.id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    Ok(row)
}

/// One-way archival lock, independent of the lifecycle state.
pub async fn archive_poll(pool: &DbPool, poll_id: i64, actor: i64) -> Result<PollRow, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    if poll.archived_at.is_some() {
        return Err(CoreError::PollAlreadyArchived);
    }

    quorum_db::polls::set_archived(pool, poll.id, Utc::now()).await?;
    tracing::info!(poll_id = poll.id, actor, "poll archived");
    let row = quorum_db::polls::get_poll(pool, poll.id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    Ok(row)
}
