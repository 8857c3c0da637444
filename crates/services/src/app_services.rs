use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::analytics::AnalyticsService;
use crate::auth::AuthProvider;
use crate::catalog::{CategoryService, QuestionService, QuizService};
use crate::error::AppServicesError;
use crate::sessions::QuizTakingService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<dyn AuthProvider>,
    quiz_taking: Arc<QuizTakingService>,
    categories: Arc<CategoryService>,
    quizzes: Arc<QuizService>,
    questions: Arc<QuestionService>,
    analytics: Arc<AnalyticsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, auth))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, auth: Arc<dyn AuthProvider>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, auth)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, auth: Arc<dyn AuthProvider>) -> Self {
        let quiz_taking = Arc::new(
            QuizTakingService::new(
                clock,
                Arc::clone(&storage.quizzes),
                Arc::clone(&storage.questions),
                Arc::clone(&storage.submissions),
            )
            .with_auth(Arc::clone(&auth)),
        );
        let categories = Arc::new(CategoryService::new(
            clock,
            Arc::clone(&auth),
            Arc::clone(&storage.categories),
        ));
        let quizzes = Arc::new(QuizService::new(
            clock,
            Arc::clone(&auth),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.questions),
        ));
        let questions = Arc::new(QuestionService::new(
            Arc::clone(&auth),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.questions),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&auth),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.submissions),
        ));

        Self {
            auth,
            quiz_taking,
            categories,
            quizzes,
            questions,
            analytics,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn quiz_taking(&self) -> Arc<QuizTakingService> {
        Arc::clone(&self.quiz_taking)
    }

    #[must_use]
    pub fn categories(&self) -> Arc<CategoryService> {
        Arc::clone(&self.categories)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics)
    }
}
