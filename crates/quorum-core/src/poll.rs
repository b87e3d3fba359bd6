use crate::authz;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use quorum_db::polls::PollRow;
use quorum_db::questions::QuestionRow;
use quorum_db::DbPool;
use quorum_models::validation;
use quorum_models::{Answer, Poll, PollScope, Question, QuestionType};

/// The three-way editability guard shared by every structural mutation:
/// not active, not finished, no votes cast. Archival locks the poll out of
/// editing entirely.
pub async fn ensure_editable(pool: &DbPool, poll: &PollRow) -> Result<(), CoreError> {
    if poll.archived_at.is_some() {
        return Err(CoreError::PollArchived);
    }
    if poll.finished {
        return Err(CoreError::PollFinished);
    }
    if poll.active {
        return Err(CoreError::PollActive);
    }
    if quorum_db::votes::poll_has_votes(pool, poll.id).await? {
        return Err(CoreError::PollHasVotes);
    }
    Ok(())
}

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
    actor: i64,
) -> Result<Poll, CoreError> {
    validation::validate_poll_title(title)?;
    validation::validate_poll_description(description)?;
    validation::validate_poll_dates(start_date, end_date)?;

    let board = quorum_db::boards::get_board(pool, board_id)
        .await?
        .ok_or(CoreError::BoardNotFound)?;
    authz::ensure_org_admin(pool, actor, board.organization_id).await?;

    let row = quorum_db::polls::create_poll(
        pool,
        board_id,
        title.trim(),
        description.trim(),
        scope,
        start_date,
        end_date,
        weight_criteria,
        actor,
    )
    .await?;
    tracing::info!(poll_id = row.id, board_id, actor, "poll created");
    Ok(assemble(row, Vec::new()))
}

#[allow(clippy::too_many_arguments)]
pub async fn update_poll(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
    title: Option<&str>,
    description: Option<&str>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    weight_criteria: Option<&str>,
) -> Result<Poll, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    ensure_editable(pool, &poll).await?;

    if let Some(title) = title {
        validation::validate_poll_title(title)?;
    }
    if let Some(description) = description {
        validation::validate_poll_description(description)?;
    }
    let effective_start = start_date.unwrap_or(poll.start_date);
    let effective_end = end_date.unwrap_or(poll.end_date);
    validation::validate_poll_dates(effective_start, effective_end)?;

    let row = quorum_db::polls::update_poll(
        pool,
        poll_id,
        title.map(str::trim),
        description.map(str::trim),
        start_date,
        end_date,
        weight_criteria,
    )
    .await?;
    poll_with_rows(pool, row).await
}

pub async fn add_question(
    pool: &DbPool,
    poll_id: i64,
    actor: i64,
    text: &str,
    details: Option<&str>,
    page: i64,
    order: i64,
    question_type: QuestionType,
) -> Result<Question, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    ensure_editable(pool, &poll).await?;

    validation::validate_question_text(text)?;
    validation::validate_question_details(details)?;
    validation::validate_page(page)?;
    validation::validate_order(order)?;

    let row = quorum_db::questions::create_question(
        pool,
        poll_id,
        text.trim(),
        details,
        page,
        order,
        question_type,
    )
    .await?;
    Ok(question_model(row, Vec::new()))
}

pub async fn update_question(
    pool: &DbPool,
    question_id: i64,
    actor: i64,
    text: Option<&str>,
    details: Option<&str>,
    page: Option<i64>,
    order: Option<i64>,
) -> Result<Question, CoreError> {
    let (question, _) = editable_question(pool, question_id, actor).await?;

    if let Some(text) = text {
        validation::validate_question_text(text)?;
    }
    validation::validate_question_details(details)?;
    if let Some(page) = page {
        validation::validate_page(page)?;
    }
    if let Some(order) = order {
        validation::validate_order(order)?;
    }

    let row = quorum_db::questions::update_question(
        pool,
        question.id,
        text.map(str::trim),
        details,
        page,
        order,
    )
    .await?;
    let answers = quorum_db::answers::live_answers(pool, row.id).await?;
    Ok(question_model(row, answers.into_iter().map(answer_model).collect()))
}

/// Archives the question. Its answers drop out of every live view through
/// the question itself.
pub async fn remove_question(
    pool: &DbPool,
    question_id: i64,
    actor: i64,
) -> Result<(), CoreError> {
    let (question, _) = editable_question(pool, question_id, actor).await?;
    quorum_db::questions::archive_question(pool, question.id).await?;
    tracing::info!(question_id = question.id, actor, "question archived");
    Ok(())
}

pub async fn add_answer(
    pool: &DbPool,
    question_id: i64,
    actor: i64,
    text: &str,
    order: i64,
) -> Result<Answer, CoreError> {
    let (question, _) = editable_question(pool, question_id, actor).await?;
    validation::validate_answer_text(text)?;
    validation::validate_order(order)?;

    let row = quorum_db::answers::create_answer(pool, question.id, text.trim(), order).await?;
    Ok(answer_model(row))
}

pub async fn update_answer(
    pool: &DbPool,
    answer_id: i64,
    actor: i64,
    text: Option<&str>,
    order: Option<i64>,
) -> Result<Answer, CoreError> {
    let answer = quorum_db::answers::get_answer(pool, answer_id)
        .await?
        .ok_or(CoreError::AnswerNotFound)?;
    if answer.is_archived() {
        return Err(CoreError::AnswerArchived);
    }
    let (_, _) = editable_question(pool, answer.question_id, actor).await?;

    if let Some(text) = text {
        validation::validate_answer_text(text)?;
    }
    if let Some(order) = order {
        validation::validate_order(order)?;
    }

    let row =
        quorum_db::answers::update_answer(pool, answer_id, text.map(str::trim), order).await?;
    Ok(answer_model(row))
}

pub async fn remove_answer(pool: &DbPool, answer_id: i64, actor: i64) -> Result<(), CoreError> {
    let answer = quorum_db::answers::get_answer(pool, answer_id)
        .await?
        .ok_or(CoreError::AnswerNotFound)?;
    if answer.is_archived() {
        return Err(CoreError::AnswerArchived);
    }
    let (_, _) = editable_question(pool, answer.question_id, actor).await?;
    quorum_db::answers::archive_answer(pool, answer_id).await?;
    Ok(())
}

/// Poll with its live questions and answers, for members of the owning
/// organization.
pub async fn get_poll(pool: &DbPool, poll_id: i64, viewer: i64) -> Result<Poll, CoreError> {
    let poll = quorum_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    if !authz::is_poll_org_member(pool, &poll, viewer).await? {
        return Err(CoreError::NotAuthorized);
    }
    poll_with_rows(pool, poll).await
}

/// Non-archived polls of a board, assembled read models.
pub async fn list_board_polls(
    pool: &DbPool,
    board_id: i64,
    viewer: i64,
) -> Result<Vec<Poll>, CoreError> {
    let board = quorum_db::boards::get_board(pool, board_id)
        .await?
        .ok_or(CoreError::BoardNotFound)?;
    let is_member = quorum_db::users::is_superadmin(pool, viewer).await?
        || quorum_db::organizations::is_member(pool, viewer, board.organization_id).await?;
    if !is_member {
        return Err(CoreError::NotAuthorized);
    }

    let rows = quorum_db::polls::list_board_polls(pool, board_id).await?;
    let mut polls = Vec::with_capacity(rows.len());
    for row in rows {
        polls.push(poll_with_rows(pool, row).await?);
    }
    Ok(polls)
}

async fn editable_question(
    pool: &DbPool,
    question_id: i64,
    actor: i64,
) -> Result<(QuestionRow, PollRow), CoreError> {
    let question = quorum_db::questions::get_question(pool, question_id)
        .await?
        .ok_or(CoreError::QuestionNotFound)?;
    let poll = quorum_db::polls::get_poll(pool, question.poll_id)
        .await?
        .ok_or(CoreError::PollNotFound)?;
    authz::ensure_poll_admin(pool, &poll, actor).await?;
    ensure_editable(pool, &poll).await?;
    if question.is_archived() {
        return Err(CoreError::QuestionArchived);
    }
    Ok((question, poll))
}

async fn poll_with_rows(pool: &DbPool, poll: PollRow) -> Result<Poll, CoreError> {
    let questions = quorum_db::questions::live_questions(pool, poll.id).await?;
    let answers = quorum_db::answers::live_poll_answers(pool, poll.id).await?;

    let mut by_question: std::collections::HashMap<i64, Vec<Answer>> =
        std::collections::HashMap::new();
    for answer in answers {
        by_question
            .entry(answer.question_id)
            .or_default()
            .push(answer_model(answer));
    }

    let questions = questions
        .into_iter()
        .map(|row| {
            let answers = by_question.remove(&row.id).unwrap_or_default();
            question_model(row, answers)
        })
        .collect();
    Ok(assemble(poll, questions))
}

fn assemble(row: PollRow, questions: Vec<Question>) -> Poll {
    Poll {
        id: row.id,
        board_id: row.board_id,
        title: row.title,
        description: row.description,
        scope: row.scope,
        start_date: row.start_date,
        end_date: row.end_date,
        active: row.active,
        finished: row.finished,
        participants_snapshot_taken: row.participants_snapshot_taken,
        weight_criteria: row.weight_criteria,
        created_by: row.created_by,
        created_at: row.created_at,
        archived_at: row.archived_at,
        questions,
    }
}

fn question_model(row: QuestionRow, answers: Vec<Answer>) -> Question {
    Question {
        id: row.id,
        poll_id: row.poll_id,
        text: row.text,
        details: row.details,
        page: row.page,
        order: row.ord,
        question_type: row.question_type,
        created_at: row.created_at,
        answers,
    }
}

fn answer_model(row: quorum_db::answers::AnswerRow) -> Answer {
    Answer {
        id: row.id,
        question_id: row.question_id,
        text: row.text,
        order: row.ord,
        created_at: row.created_at,
    }
}
