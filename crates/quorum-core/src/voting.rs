use crate::error::CoreError;
use quorum_db::participants::ParticipantRow;
use quorum_db::polls::PollRow;
use quorum_db::DbPool;
use quorum_models::{QuestionType, Vote, VoteDraft};
use std::collections::{HashMap, HashSet};

/// Shared guard chain for every ballot operation: the poll must exist and
/// be open for voting, the caller must be on the frozen roster and must not
/// have committed yet.
async fn ensure_votable(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<(PollRow, ParticipantRow), CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    if poll.finished {
        return Err(CoreError::PollFinished);
    }
    if !poll.active {
        return Err(CoreError::PollNotActive);
    }
    let participant = quorum_db::participants::find_participant(pool, poll_id, user_id)
        .await?
        .ok_or(CoreError::NotParticipant)?;
    if has_user_finished_voting(pool, poll_id, user_id).await? {
        return Err(CoreError::AlreadyVoted);
    }
    Ok((poll, participant))
}

/// Create or replace a draft. Single-choice questions keep at most one
/// draft per user; multiple-choice selections accumulate.
pub async fn submit_draft(
    pool: &DbPool,
    poll_id: i64,
    question_id: i64,
    answer_id: i64,
    user_id: i64,
) -> Result<VoteDraft, CoreError> {
    ensure_votable(pool, poll_id, user_id).await?;

    let question = quorum_db::questions::get_question(pool, question_id)
        .await?
        .filter(|q| q.poll_id == poll_id)
        .ok_or(CoreError::QuestionNotFound)?;
    if question.is_archived() {
        return Err(CoreError::QuestionArchived);
    }
    let answer = quorum_db::answers::get_answer(pool, answer_id)
        .await?
        .filter(|a| a.question_id == question_id)
        .ok_or(CoreError::AnswerNotFound)?;
    if answer.is_archived() {
        return Err(CoreError::AnswerArchived);
    }

    let row = match question.question_type {
        QuestionType::SingleChoice => {
            quorum_db::vote_drafts::replace_question_draft(pool, poll_id, question_id, answer_id, user_id)
                .await?
        }
        QuestionType::MultipleChoice => {
            quorum_db::vote_drafts::upsert_draft(pool, poll_id, question_id, answer_id, user_id)
                .await?
        }
    };
    Ok(draft_model(row))
}

/// Toggle-style deselection. Removing a draft that does not exist is a
/// no-op success.
pub async fn remove_draft(
    pool: &DbPool,
    poll_id: i64,
    question_id: i64,
    answer_id: i64,
    user_id: i64,
) -> Result<(), CoreError> {
    ensure_votable(pool, poll_id, user_id).await?;
    quorum_db::vote_drafts::delete_draft(pool, question_id, answer_id, user_id).await?;
    Ok(())
}

/// The caller's outstanding drafts for the poll.
pub async fn user_drafts(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<Vec<VoteDraft>, CoreError> {
    quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    quorum_db::participants::find_participant(pool, poll_id, user_id)
        .await?
        .ok_or(CoreError::NotParticipant)?;
    let rows = quorum_db::vote_drafts::user_poll_drafts(pool, poll_id, user_id).await?;
    Ok(rows.into_iter().map(draft_model).collect())
}

/// Derived, never stored: the user finished voting exactly when their votes
/// cover every live question. A poll without live questions has nothing to
/// vote on and nobody is finished.
pub async fn has_user_finished_voting(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<bool, CoreError> {
    let total = quorum_db::questions::live_question_count(pool, poll_id).await?;
    if total == 0 {
        return Ok(false);
    }
    let answered =
        quorum_db::votes::distinct_answered_live_question_count(pool, poll_id, user_id).await?;
    Ok(answered == total)
}

/// Promote the caller's drafts to immutable votes. All-or-nothing per
/// user: the ballot must cover every live question, single-choice questions
/// must carry exactly one selection, and the vote batch plus draft cleanup
/// commit in one transaction. Votes freeze the participant's weight as it
/// stands right now.
pub async fn finish_voting(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
) -> Result<Vec<Vote>, CoreError> {
    let (_, participant) = ensure_votable(pool, poll_id, user_id).await?;

    let drafts = quorum_db::vote_drafts::user_poll_drafts(pool, poll_id, user_id).await?;
    let live_questions = quorum_db::questions::live_questions(pool, poll_id).await?;
    let question_types: HashMap<i64, QuestionType> = live_questions
        .iter()
        .map(|q| (q.id, q.question_type))
        .collect();

    let covered: HashSet<i64> = drafts
        .iter()
        .map(|d| d.question_id)
        .filter(|id| question_types.contains_key(id))
        .collect();
    if covered.len() != live_questions.len() {
        return Err(CoreError::MustAnswerAllQuestions);
    }

    for question in &live_questions {
        if question.question_type != QuestionType::SingleChoice {
            continue;
        }
        let count = drafts.iter().filter(|d| d.question_id == question.id).count();
        if count > 1 {
            return Err(CoreError::SingleChoiceMultipleAnswers(question.id));
        }
    }

    // Drafts whose question was archived since they were written are
    // dropped; the question no longer exists for voting purposes.
    let selections: Vec<(i64, i64)> = drafts
        .iter()
        .filter(|d| question_types.contains_key(&d.question_id))
        .map(|d| (d.question_id, d.answer_id))
        .collect();

    let rows = quorum_db::votes::commit_votes_and_clear_drafts(
        pool,
        poll_id,
        user_id,
        participant.user_weight,
        &selections,
    )
    .await?;
    Ok(rows.into_iter().map(vote_model).collect())
}

fn draft_model(row: quorum_db::vote_drafts::DraftRow) -> VoteDraft {
    VoteDraft {
        id: row.id,
        poll_id: row.poll_id,
        question_id: row.question_id,
        answer_id: row.answer_id,
        user_id: row.user_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn vote_model(row: quorum_db::votes::VoteRow) -> Vote {
    Vote {
        id: row.id,
        question_id: row.question_id,
        answer_id: row.answer_id,
        user_id: row.user_id,
        user_weight: row.user_weight,
        created_at: row.created_at,
    }
}
