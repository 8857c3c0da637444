mod attempt;
mod coordinator;
mod progress;
mod service;
mod timer;

// Public API of the session subsystem.
pub use crate::error::{SessionError, SubmitError};
pub use attempt::QuizSession;
pub use coordinator::{SubmissionCoordinator, SubmissionOutcome, SubmissionPhase};
pub use progress::SessionProgress;
pub use service::QuizTakingService;
pub use timer::SessionTimer;
