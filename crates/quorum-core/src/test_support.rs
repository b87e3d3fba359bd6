use chrono::{TimeZone, Utc};
use quorum_db::polls::PollRow;
use quorum_db::DbPool;
use quorum_models::{PollScope, QuestionType};

pub async fn test_pool() -> DbPool {
    let pool = quorum_db::create_pool("sqlite::memory:", 1).await.unwrap();
    quorum_db::run_migrations(&pool).await.unwrap();
    pool
}

pub struct Fixture {
    pub org_id: i64,
    pub board_id: i64,
    pub admin_id: i64,
    pub poll_id: i64,
}

/// Organization, board, accepted org admin and a draft board-scoped poll.
pub async fn fixture(pool: &DbPool) -> Fixture {
    let org = quorum_db::organizations::create_organization(pool, "Org", None)
        .await
        .unwrap();
    let board = quorum_db::boards::create_board(pool, org.id, "Board")
        .await
        .unwrap();
    let admin = quorum_db::users::create_user(pool, "admin", None).await.unwrap();
    quorum_db::organizations::add_member(
        pool,
        org.id,
        admin.id,
        quorum_db::organizations::ORG_ROLE_ADMIN,
        quorum_db::organizations::ORG_STATUS_ACCEPTED,
    )
    .await
    .unwrap();
    let poll = quorum_db::polls::create_poll(
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
    Fixture {
        org_id: org.id,
        board_id: board.id,
        admin_id: admin.id,
        poll_id: poll.id,
    }
}

/// Accepted org member who also sits on the board.
pub async fn add_board_voter(pool: &DbPool, fx: &Fixture, name: &str) -> i64 {
    let user = quorum_db::users::create_user(pool, name, None).await.unwrap();
    quorum_db::organizations::add_member(
        pool,
        fx.org_id,
        user.id,
        quorum_db::organizations::ORG_ROLE_MEMBER,
        quorum_db::organizations::ORG_STATUS_ACCEPTED,
    )
    .await
    .unwrap();
    quorum_db::boards::add_member(pool, fx.board_id, user.id)
        .await
        .unwrap();
    user.id
}

/// Accepted org member without a board seat.
pub async fn add_org_member(pool: &DbPool, fx: &Fixture, name: &str) -> i64 {
    let user = quorum_db::users::create_user(pool, name, None).await.unwrap();
    quorum_db::organizations::add_member(
        pool,
        fx.org_id,
        user.id,
        quorum_db::organizations::ORG_ROLE_MEMBER,
        quorum_db::organizations::ORG_STATUS_ACCEPTED,
    )
    .await
    .unwrap();
    user.id
}

pub async fn question_with_answers(
    pool: &DbPool,
    poll_id: i64,
    text: &str,
    question_type: QuestionType,
    answers: &[&str],
) -> (i64, Vec<i64>) {
    let question =
        quorum_db::questions::create_question(pool, poll_id, text, None, 1, 0, question_type)
            .await
            .unwrap();
    let mut answer_ids = Vec::new();
    for (ord, answer) in answers.iter().enumerate() {
        let row = quorum_db::answers::create_answer(pool, question.id, answer, ord as i64)
            .await
            .unwrap();
        answer_ids.push(row.id);
    }
    (question.id, answer_ids)
}

/// In-memory row for pure state-machine tests.
pub fn poll_row(active: bool, finished: bool, snapshot_taken: bool) -> PollRow {
    PollRow {
        id: 1,
        board_id: 1,
        title: "T".to_string(),
        description: "D".to_string(),
        scope: PollScope::Board,
        start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap(),
        active,
        finished,
        participants_snapshot_taken: snapshot_taken,
        weight_criteria: None,
        created_by: 1,
        created_at: Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        archived_at: None,
    }
}
