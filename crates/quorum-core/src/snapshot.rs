use crate::authz;
use crate::error::CoreError;
use crate::lifecycle::PollState;
use quorum_db::polls::PollRow;
use quorum_db::DbPool;
use quorum_models::{Participant, PollScope, WeightHistoryEntry};

/// Resolve who gets frozen into the roster. Board scope takes the current
/// board members; organization scope takes accepted members of the owning
/// organization and all of its descendants, deduplicated.
pub(crate) async fn snapshot_user_ids(pool: &DbPool, poll: &PollRow) -> Result<Vec<i64>, CoreError> {
    match poll.scope {
        PollScope::Board => {
            Ok(quorum_db::boards::board_member_user_ids(pool, poll.board_id).await?)
        }
        PollScope::Organization => {
            let org_id = authz::poll_org_id(pool, poll).await?;
            Ok(
                quorum_db::organizations::org_member_user_ids_including_descendants(pool, org_id)
                    .await?,
            )
        }
    }
}

/// Freeze the roster without activating (Draft -> Ready). One-shot: the
/// flag guards against re-deriving membership or resetting weights later.
pub async fn take_snapshot(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
) -> Result<Vec<Participant>, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    match PollState::of(&poll) {
        PollState::Finished => return Err(CoreError::PollAlreadyFinished),
        PollState::Ready | PollState::Active => return Err(CoreError::SnapshotAlreadyTaken),
        PollState::Draft => {}
    }

    let user_ids = snapshot_user_ids(pool, &poll).await?;
    let rows =
        quorum_db::participants::execute_activation(pool, poll.id, &user_ids, actor, false).await?;
    participants_with_names(pool, rows).await
}

/// Narrow reversal (Ready -> Draft): allowed only while nobody has voted.
/// The roster is dropped and membership may be re-derived later; the weight
/// audit trail stays.
pub async fn discard_snapshot(pool: &DbPool, poll_id: i64, actor: i64) -> Result<(), CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    match PollState::of(&poll) {
        PollState::Finished => return Err(CoreError::PollFinished),
        PollState::Active => return Err(CoreError::PollActive),
        PollState::Draft => return Err(CoreError::SnapshotNotTaken),
        PollState::Ready => {}
    }
    if quorum_db::votes::poll_has_votes(pool, poll.id).await? {
        return Err(CoreError::PollHasVotes);
    }

    quorum_db::participants::discard_snapshot(pool, poll.id).await?;
    tracing::info!(poll_id = poll.id, actor, "participant snapshot discarded");
    Ok(())
}

/// Weight change with its paired audit row. Frozen for good once any vote
/// exists; the weight copied into votes at commit time must stay the weight
/// that was in force.
pub async fn update_participant_weight(
    pool: &DbPool,
    participant_id: i64,
    new_weight: f64,
    actor: i64,
    reason: Option<&str>,
) -> Result<Participant, CoreError> {
    quorum_models::validation::validate_weight(new_weight)?;

    let participant = quorum_db::participants::get_participant(pool, participant_id)
        .await?
        .ok_or(CoreError::ParticipantNotFound)?;
    let poll = quorum_db::polls::get_poll(pool, participant.poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    if quorum_db::votes::poll_has_votes(pool, poll.id).await? {
        return Err(CoreError::CannotModifyParticipantsHasVotes);
    }

    let updated =
        quorum_db::participants::update_weight(pool, participant_id, new_weight, actor, reason)
            .await?;
    tracing::info!(
        poll_id = poll.id,
        participant_id,
        new_weight,
        actor,
        "participant weight updated"
    );
    let mut with_names = participants_with_names(pool, vec![updated]).await?;
    Ok(with_names.remove(0))
}

/// Same freeze rule as weight changes: the roster is immutable once votes
/// exist.
pub async fn remove_participant(
    pool: &DbPool,
    participant_id: i64,
    actor: i64,
) -> Result<(), CoreError> {
    let participant = quorum_db::participants::get_participant(pool, participant_id)
        .await?
        .ok_or(CoreError::ParticipantNotFound)?;
    let poll = quorum_db::polls::get_poll(pool, participant.poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    if !poll.participants_snapshot_taken {
        return Err(CoreError::SnapshotNotTaken);
    }
    if quorum_db::votes::poll_has_votes(pool, poll.id).await? {
        return Err(CoreError::CannotModifyParticipantsHasVotes);
    }

    quorum_db::participants::remove_participant(pool, participant_id).await?;
    tracing::info!(poll_id = poll.id, participant_id, actor, "participant removed");
    Ok(())
}

/// Admin view of the frozen roster.
pub async fn list_participants(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
) -> Result<Vec<Participant>, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    let rows = quorum_db::participants::poll_participants(pool, poll_id).await?;
    participants_with_names(pool, rows).await
}

/// Admin view of the append-only weight audit trail, oldest first.
pub async fn weight_history(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
) -> Result<Vec<WeightHistoryEntry>, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;

    let rows = quorum_db::participants::weight_history(pool, poll_id).await?;
    let actor_ids: Vec<i64> = rows.iter().map(|row| row.changed_by).collect();
    let names = quorum_db::users::display_names(pool, &actor_ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let changed_by_name = names.get(&row.changed_by).cloned().unwrap_or_default();
            WeightHistoryEntry {
                id: row.id,
                participant_id: row.participant_id,
                poll_id: row.poll_id,
                user_id: row.user_id,
                old_weight: row.old_weight,
                new_weight: row.new_weight,
                changed_by: row.changed_by,
                changed_by_name,
                reason: row.reason,
                changed_at: row.changed_at,
            }
        })
        .collect())
}

async fn participants_with_names(
    pool: &DbPool,
    rows: Vec<quorum_db::participants::ParticipantRow>,
) -> Result<Vec<Participant>, CoreError> {
    let user_ids: Vec<i64> = rows.iter().map(|row| row.user_id).collect();
    let names = quorum_db::users::display_names(pool, &user_ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let name = names.get(&row.user_id).cloned().unwrap_or_default();
            Participant {
                id: row.id,
                poll_id: row.poll_id,
                user_id: row.user_id,
                name,
                user_weight: row.user_weight,
                snapshot_at: row.snapshot_at,
            }
        })
        .collect())
}
