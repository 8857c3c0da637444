//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CategoryError, QuestionError, QuizError, QuizId, SubmissionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by an `AuthProvider`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("sign in required")]
    NotSignedIn,
    #[error("administrator access required")]
    Forbidden,
    #[error("authentication backend failed: {0}")]
    Backend(String),
}

/// Input rejected before any score is computed or anything is stored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("please enter your name before submitting")]
    EmptyDisplayName,
    #[error(transparent)]
    Snapshot(#[from] SubmissionError),
}

/// Errors emitted by `SubmissionCoordinator::submit`.
///
/// Storage failures are flattened into a displayable message; no
/// `StorageError` leaves the coordinator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a submission is already in progress")]
    InProgress,
    #[error("this attempt has already been submitted")]
    AlreadySubmitted,
    #[error("failed to submit quiz: {message}")]
    Persistence { message: String },
}

/// Errors emitted while opening a quiz session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {0} is not available")]
    Unavailable(QuizId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the catalog services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
