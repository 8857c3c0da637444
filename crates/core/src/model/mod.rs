mod answer;
mod category;
mod ids;
mod question;
mod quiz;
mod submission;

pub use ids::{CategoryId, OptionId, ParseIdError, QuestionId, QuizId, SubmissionId};

pub use answer::{AnswerRecord, Response};
pub use category::{Category, CategoryDraft, CategoryError, ValidatedCategory};
pub use question::{
    AnswerOption, Question, QuestionDraft, QuestionError, QuestionKind, ValidatedQuestion,
};
pub use quiz::{Quiz, QuizDraft, QuizError, QuizStatus, ValidatedQuiz, check_rating};
pub use submission::{Score, Submission, SubmissionError, SubmissionSnapshot, SubmittedAnswer};
