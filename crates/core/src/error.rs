use thiserror::Error;

use crate::model::{CategoryError, QuestionError, QuizError, SubmissionError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
