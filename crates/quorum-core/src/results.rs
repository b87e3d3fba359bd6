use crate::authz;
use crate::error::CoreError;
use quorum_db::DbPool;
use quorum_models::{AnswerResult, AnswerVoter, PollResults, QuestionResult};
use std::collections::HashMap;

/// Weighted tally over the frozen roster. Percentages are taken against
/// the total eligible weight, not the weight actually cast, so abstentions
/// show up as missing percentage points.
///
/// Visibility: admins any time; once the poll is finished, any member of
/// the owning organization. The per-answer voter breakdown is admin-only,
/// and deliberately not creator-visible.
pub async fn poll_results(
    pool: &DbPool,
    poll_id: i64,
    viewer: i64,
) -> Result<PollResults, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;

    let is_admin = authz::is_poll_admin(pool, &poll, viewer).await?;
    if !is_admin {
        if !poll.finished {
            return Err(CoreError::NotAuthorized);
        }
        if !authz::is_poll_org_member(pool, &poll, viewer).await? {
            return Err(CoreError::NotAuthorized);
        }
    }
    let can_view_voters = is_admin;

    let total_participant_weight =
        quorum_db::participants::total_weight(pool, poll.id).await?;
    let votes = quorum_db::votes::poll_votes(pool, poll.id).await?;
    let questions = quorum_db::questions::live_questions(pool, poll.id).await?;
    let answers = quorum_db::answers::live_poll_answers(pool, poll.id).await?;

    let voter_names: HashMap<i64, String> = if can_view_voters {
        let voter_ids: Vec<i64> = votes.iter().map(|v| v.user_id).collect();
        quorum_db::users::display_names(pool, &voter_ids).await?
    } else {
        HashMap::new()
    };

    // votes keyed by answer; archived questions and answers simply never
    // get looked up
    let mut by_answer: HashMap<i64, Vec<&quorum_db::votes::VoteRow>> = HashMap::new();
    for vote in &votes {
        by_answer.entry(vote.answer_id).or_default().push(vote);
    }

    let mut answers_by_question: HashMap<i64, Vec<quorum_db::answers::AnswerRow>> = HashMap::new();
    for answer in answers {
        answers_by_question
            .entry(answer.question_id)
            .or_default()
            .push(answer);
    }

    let question_results = questions
        .into_iter()
        .map(|question| {
            let answer_rows = answers_by_question.remove(&question.id).unwrap_or_default();
            let answers = answer_rows
                .into_iter()
                .map(|answer| {
                    let cast = by_answer.get(&answer.id).map(Vec::as_slice).unwrap_or(&[]);
                    let vote_count = cast.len() as i64;
                    let total_weight: f64 = cast.iter().map(|v| v.user_weight).sum();
                    let percentage = if total_participant_weight == 0.0 {
                        0.0
                    } else {
                        total_weight / total_participant_weight * 100.0
                    };
                    let voters = if can_view_voters {
                        cast.iter()
                            .map(|v| AnswerVoter {
                                user_id: v.user_id,
                                name: voter_names.get(&v.user_id).cloned().unwrap_or_default(),
                                weight: v.user_weight,
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    AnswerResult {
                        answer_id: answer.id,
                        text: answer.text,
                        order: answer.ord,
                        vote_count,
                        total_weight,
                        percentage,
                        voters,
                    }
                })
                .collect();
            QuestionResult {
                question_id: question.id,
                text: question.text,
                question_type: question.question_type,
                page: question.page,
                order: question.ord,
                answers,
            }
        })
        .collect();

    tracing::debug!(poll_id, total_participant_weight, "poll results computed");
    Ok(PollResults {
        poll_id,
        total_participant_weight,
        can_view_voters,
        questions: question_results,
    })
}
