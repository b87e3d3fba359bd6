pub mod answer;
pub mod participant;
pub mod poll;
pub mod question;
pub mod results;
pub mod validation;
pub mod vote;

pub use answer::Answer;
pub use participant::{Participant, WeightHistoryEntry};
pub use poll::{Poll, PollScope};
pub use question::{Question, QuestionType};
pub use results::{AnswerResult, AnswerVoter, PollResults, QuestionResult};
pub use vote::{Vote, VoteDraft};
