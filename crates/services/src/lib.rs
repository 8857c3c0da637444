#![forbid(unsafe_code)]

pub mod analytics;
pub mod app_services;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use analytics::{ActivityDay, AnalyticsService, DashboardStats, ParticipantSummary, RecentSubmission};
pub use app_services::AppServices;
pub use auth::{AuthProvider, AuthSession, InMemoryAuthProvider, require_admin};
pub use catalog::{CategoryService, QuestionService, QuizService};
pub use error::{
    AnalyticsError, AppServicesError, AuthError, CatalogError, SessionError, SubmitError,
    ValidationError,
};
pub use sessions::{
    QuizSession, QuizTakingService, SessionProgress, SessionTimer, SubmissionCoordinator,
    SubmissionOutcome, SubmissionPhase,
};
