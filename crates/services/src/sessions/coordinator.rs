use std::sync::{Arc, Mutex, MutexGuard};

use quiz_core::model::{Question, QuizId, Score, SubmissionId, SubmissionSnapshot, SubmittedAnswer};
use quiz_core::session::{AnswerStore, score};
use storage::repository::{QuizRepository, SubmissionRepository};

use crate::Clock;
use crate::auth::AuthProvider;
use crate::error::{SubmitError, ValidationError};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a session's submission stands.
///
/// A failed attempt goes straight back to `Idle`; the failure itself is kept
/// in `SubmissionCoordinator::last_error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Completed,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    phase: SubmissionPhase,
    last_error: Option<String>,
    /// Bumped by `reset`; a persist task only settles the attempt it began.
    attempt: u64,
}

impl CoordinatorState {
    /// Apply the result of `attempt`, unless the coordinator moved on since.
    fn settle(&mut self, attempt: u64, phase: SubmissionPhase, error: Option<String>) -> bool {
        if self.attempt != attempt {
            return false;
        }
        self.phase = phase;
        self.last_error = error;
        true
    }
}

/// What the caller gets back once a submission is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub submission_id: SubmissionId,
    pub score: Score,
    pub answers: Vec<SubmittedAnswer>,
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Turns a session's answers into exactly one stored submission.
///
/// The phase is checked and set under a synchronous lock before anything is
/// awaited, so a second `submit` issued while the first is in flight is
/// rejected without touching the scorer or the repository.
pub struct SubmissionCoordinator {
    clock: Clock,
    submissions: Arc<dyn SubmissionRepository>,
    quizzes: Arc<dyn QuizRepository>,
    auth: Option<Arc<dyn AuthProvider>>,
    state: Arc<Mutex<CoordinatorState>>,
}

impl SubmissionCoordinator {
    #[must_use]
    pub fn new(
        clock: Clock,
        submissions: Arc<dyn SubmissionRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            clock,
            submissions,
            quizzes,
            auth: None,
            state: Arc::new(Mutex::new(CoordinatorState::default())),
        }
    }

    /// Attach the signed-in user's id to stored submissions.
    #[must_use]
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        lock(&self.state).phase
    }

    /// Message of the most recent failed attempt, cleared on the next try.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Return to `Idle` so the session can be taken again.
    ///
    /// A submission still in flight keeps running and is stored, but it no
    /// longer affects this coordinator's phase.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.attempt = state.attempt.wrapping_add(1);
        state.phase = SubmissionPhase::Idle;
        state.last_error = None;
    }

    /// Validate, score once, and persist a submission.
    ///
    /// On success the quiz's attempt counter is bumped in the background;
    /// a failure there is only logged.
    ///
    /// # Errors
    ///
    /// - `SubmitError::InProgress` while another submit is running.
    /// - `SubmitError::AlreadySubmitted` once a submission was stored.
    /// - `SubmitError::Validation` for a blank display name; nothing is sent.
    /// - `SubmitError::Persistence` when the repository rejects the insert;
    ///   the coordinator is `Idle` again and may be retried.
    pub async fn submit(
        &self,
        quiz_id: QuizId,
        questions: &[Question],
        answers: &AnswerStore,
        display_name: &str,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let attempt = self.begin()?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            self.fail_validation(None);
            return Err(ValidationError::EmptyDisplayName.into());
        }

        let frozen = score(questions, answers);
        let submitted = answers.to_submitted();
        let user_id = self
            .auth
            .as_ref()
            .and_then(|auth| auth.current_session())
            .map(|session| session.user_id);

        let snapshot = match SubmissionSnapshot::new(
            quiz_id,
            user_id,
            display_name,
            frozen,
            self.clock.now(),
            submitted,
        ) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.fail_validation(Some(e.to_string()));
                return Err(ValidationError::from(e).into());
            }
        };

        lock(&self.state).phase = SubmissionPhase::Submitting;
        tracing::debug!(%quiz_id, earned = frozen.earned, total = frozen.total, "submitting quiz");

        // The insert runs on its own task so a dropped caller cannot strand
        // the coordinator in `Submitting`.
        let task = tokio::spawn(persist(
            snapshot,
            Arc::clone(&self.submissions),
            Arc::clone(&self.quizzes),
            Arc::clone(&self.state),
            attempt,
        ));

        match task.await {
            Ok(result) => result,
            Err(join_err) => {
                let message = join_err.to_string();
                lock(&self.state).settle(attempt, SubmissionPhase::Idle, Some(message.clone()));
                Err(SubmitError::Persistence { message })
            }
        }
    }

    fn begin(&self) -> Result<u64, SubmitError> {
        let mut state = lock(&self.state);
        match state.phase {
            SubmissionPhase::Validating | SubmissionPhase::Submitting => {
                Err(SubmitError::InProgress)
            }
            SubmissionPhase::Completed => Err(SubmitError::AlreadySubmitted),
            SubmissionPhase::Idle => {
                state.phase = SubmissionPhase::Validating;
                state.last_error = None;
                Ok(state.attempt)
            }
        }
    }

    fn fail_validation(&self, message: Option<String>) {
        let mut state = lock(&self.state);
        state.phase = SubmissionPhase::Idle;
        state.last_error = message;
    }
}

async fn persist(
    snapshot: SubmissionSnapshot,
    submissions: Arc<dyn SubmissionRepository>,
    quizzes: Arc<dyn QuizRepository>,
    state: Arc<Mutex<CoordinatorState>>,
    attempt: u64,
) -> Result<SubmissionOutcome, SubmitError> {
    let quiz_id = snapshot.quiz_id();
    match submissions.create_submission(&snapshot).await {
        Ok(stored) => {
            if !lock(&state).settle(attempt, SubmissionPhase::Completed, None) {
                tracing::debug!(%quiz_id, submission_id = %stored.id, "stored submission of a restarted attempt");
            }
            tracing::info!(%quiz_id, submission_id = %stored.id, "quiz submitted");

            tokio::spawn(async move {
                if let Err(e) = quizzes.increment_attempts(quiz_id).await {
                    tracing::warn!(%quiz_id, error = %e, "failed to update quiz attempts");
                }
            });

            Ok(SubmissionOutcome {
                submission_id: stored.id,
                score: stored.snapshot.score(),
                answers: stored.snapshot.answers().to_vec(),
            })
        }
        Err(e) => {
            let message = e.to_string();
            tracing::warn!(%quiz_id, error = %message, "submission rejected");
            lock(&state).settle(attempt, SubmissionPhase::Idle, Some(message.clone()));
            Err(SubmitError::Persistence { message })
        }
    }
}

/// The state holds plain values, so a poisoned lock is still consistent.
fn lock(state: &Mutex<CoordinatorState>) -> MutexGuard<'_, CoordinatorState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
