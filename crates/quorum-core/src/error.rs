use quorum_db::DbError;
use quorum_models::validation::ValidationError;
use thiserror::Error;

/// Every expected failure crosses the boundary as a variant here, never as
/// a panic. `code()` is the stable identifier downstream layers localize.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("poll not found")]
    PollNotFound,
    #[error("board not found")]
    BoardNotFound,
    #[error("question not found")]
    QuestionNotFound,
    #[error("answer not found")]
    AnswerNotFound,
    #[error("participant not found")]
    ParticipantNotFound,

    #[error("not authorized")]
    NotAuthorized,

    #[error("a finished poll cannot be activated")]
    CannotActivateFinished,
    #[error("poll is already active")]
    PollAlreadyActive,
    #[error("poll has no questions")]
    PollNoQuestions,
    #[error("question {0} has no answers")]
    PollQuestionNoAnswers(i64),
    #[error("poll is not active")]
    PollNotActive,
    #[error("poll is already finished")]
    PollAlreadyFinished,
    #[error("poll is finished")]
    PollFinished,
    #[error("poll is active")]
    PollActive,
    #[error("poll is already archived")]
    PollAlreadyArchived,
    #[error("poll is archived")]
    PollArchived,
    #[error("poll already has votes")]
    PollHasVotes,
    #[error("question is archived")]
    QuestionArchived,
    #[error("answer is archived")]
    AnswerArchived,

    #[error("participants snapshot already taken")]
    SnapshotAlreadyTaken,
    #[error("participants snapshot not taken")]
    SnapshotNotTaken,
    #[error("cannot modify participants once votes exist")]
    CannotModifyParticipantsHasVotes,

    #[error("user is not a participant of this poll")]
    NotParticipant,
    #[error("user has already finished voting")]
    AlreadyVoted,
    #[error("every question must be answered before finishing")]
    MustAnswerAllQuestions,
    #[error("single-choice question {0} has more than one answer selected")]
    SingleChoiceMultipleAnswers(i64),

    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl CoreError {
    /// Stable machine-readable identifier, the only wire format the engine
    /// commits to.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::PollNotFound => "domain.poll.notFound",
            CoreError::BoardNotFound => "domain.board.notFound",
            CoreError::QuestionNotFound => "domain.question.notFound",
            CoreError::AnswerNotFound => "domain.answer.notFound",
            CoreError::ParticipantNotFound => "domain.participant.notFound",
            CoreError::NotAuthorized => "domain.auth.forbidden",
            CoreError::CannotActivateFinished => "domain.poll.cannotActivateFinished",
            CoreError::PollAlreadyActive => "domain.poll.alreadyActive",
            CoreError::PollNoQuestions => "domain.poll.noQuestions",
            CoreError::PollQuestionNoAnswers(_) => "domain.poll.questionNoAnswers",
            CoreError::PollNotActive => "domain.poll.notActive",
            CoreError::PollAlreadyFinished => "domain.poll.alreadyFinished",
            CoreError::PollFinished => "domain.poll.finished",
            CoreError::PollActive => "domain.poll.active",
            CoreError::PollAlreadyArchived => "domain.poll.alreadyArchived",
            CoreError::PollArchived => "domain.poll.archived",
            CoreError::PollHasVotes => "domain.poll.hasVotes",
            CoreError::QuestionArchived => "domain.question.archived",
            CoreError::AnswerArchived => "domain.answer.archived",
            CoreError::SnapshotAlreadyTaken => "domain.poll.snapshotAlreadyTaken",
            CoreError::SnapshotNotTaken => "domain.poll.snapshotNotTaken",
            CoreError::CannotModifyParticipantsHasVotes => {
                "domain.participant.cannotModifyHasVotes"
            }
            CoreError::NotParticipant => "domain.vote.notParticipant",
            CoreError::AlreadyVoted => "domain.vote.alreadyVoted",
            CoreError::MustAnswerAllQuestions => "domain.vote.mustAnswerAllQuestions",
            CoreError::SingleChoiceMultipleAnswers(_) => "domain.vote.singleChoiceMultipleAnswers",
            CoreError::Validation(err) => match err {
                ValidationError::Length { .. } => "domain.validation.length",
                ValidationError::DateRange => "domain.validation.dateRange",
                ValidationError::Page => "domain.validation.page",
                ValidationError::Order => "domain.validation.order",
                ValidationError::Weight => "domain.poll.invalidWeight",
            },
            CoreError::Db(DbError::NotFound) => "domain.notFound",
            CoreError::Db(_) => "internal.database",
        }
    }
}
