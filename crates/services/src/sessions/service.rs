use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::QuizId;
use storage::repository::{QuestionRepository, QuizRepository, SubmissionRepository};

use super::attempt::QuizSession;
use super::coordinator::SubmissionCoordinator;
use crate::Clock;
use crate::auth::AuthProvider;
use crate::error::SessionError;

const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Opens quiz sessions from storage.
#[derive(Clone)]
pub struct QuizTakingService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    auth: Option<Arc<dyn AuthProvider>>,
    tick: Option<Duration>,
}

impl QuizTakingService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            questions,
            submissions,
            auth: None,
            tick: Some(DEFAULT_TICK),
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Tick period of the elapsed timer; `None` leaves sessions untimed.
    #[must_use]
    pub fn with_tick(mut self, tick: Option<Duration>) -> Self {
        self.tick = tick;
        self
    }

    /// Load a published quiz with its questions and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unavailable` if the quiz is missing, still a
    /// draft, or has no questions.
    /// Returns `SessionError::Storage` if repository access fails.
    pub async fn start_session(&self, quiz_id: QuizId) -> Result<QuizSession, SessionError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .filter(quiz_core::model::Quiz::is_published)
            .ok_or(SessionError::Unavailable(quiz_id))?;

        let questions = self.questions.list_questions(quiz_id).await?;
        if questions.is_empty() {
            tracing::warn!(%quiz_id, "quiz has no questions");
            return Err(SessionError::Unavailable(quiz_id));
        }

        let mut coordinator = SubmissionCoordinator::new(
            self.clock,
            Arc::clone(&self.submissions),
            Arc::clone(&self.quizzes),
        );
        if let Some(auth) = &self.auth {
            coordinator = coordinator.with_auth(Arc::clone(auth));
        }

        tracing::debug!(%quiz_id, questions = questions.len(), "session started");
        let mut session = QuizSession::new(quiz, questions, coordinator);
        if let Some(tick) = self.tick {
            session.start_timer(tick);
        }
        Ok(session)
    }
}
