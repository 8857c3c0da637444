use std::time::Duration;

use quiz_core::model::{AnswerRecord, Question, QuestionId, Quiz, Response, Score};
use quiz_core::session::{AnswerStore, ElapsedCounter, NavigationCursor, score};

use super::coordinator::{SubmissionCoordinator, SubmissionOutcome, SubmissionPhase};
use super::progress::SessionProgress;
use super::timer::SessionTimer;
use crate::error::SubmitError;

/// One user's attempt at one quiz.
///
/// Owns the question sequence, the cursor, the answers and the elapsed
/// counter. Mutations take `&mut self`; `submit` takes `&self` so a second
/// submit can race the first and be turned away by the coordinator.
pub struct QuizSession {
    quiz: Quiz,
    questions: Vec<Question>,
    cursor: NavigationCursor,
    answers: AnswerStore,
    elapsed: ElapsedCounter,
    timer: Option<SessionTimer>,
    display_name: String,
    coordinator: SubmissionCoordinator,
}

impl QuizSession {
    #[must_use]
    pub fn new(quiz: Quiz, questions: Vec<Question>, coordinator: SubmissionCoordinator) -> Self {
        let cursor = NavigationCursor::new(questions.len());
        Self {
            quiz,
            questions,
            cursor,
            answers: AnswerStore::new(),
            elapsed: ElapsedCounter::new(),
            timer: None,
            display_name: String::new(),
            coordinator,
        }
    }

    /// Start (or restart) the elapsed-seconds ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_timer(&mut self, period: Duration) {
        self.timer = Some(SessionTimer::start(self.elapsed.clone(), period));
    }

    pub fn stop_timer(&mut self) {
        self.timer = None;
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor.index())
    }

    /// Record `response` for the question under the cursor.
    pub fn answer_current(&mut self, response: Response) -> Option<&AnswerRecord> {
        let question = self.questions.get(self.cursor.index())?;
        Some(self.answers.record_answer(question, response))
    }

    /// Record `response` for any question of this session.
    ///
    /// Ids that do not belong to the session are ignored.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        response: Response,
    ) -> Option<&AnswerRecord> {
        let question = self.questions.iter().find(|q| q.id() == question_id)?;
        Some(self.answers.record_answer(question, response))
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.answers.get(question_id)
    }

    pub fn advance(&mut self) -> bool {
        self.cursor.advance()
    }

    pub fn retreat(&mut self) -> bool {
        self.cursor.retreat()
    }

    pub fn jump_to(&mut self, index: usize) {
        self.cursor.jump_to(index);
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.cursor.is_first()
    }

    /// Whether the cursor sits on the final question, where the UI offers
    /// submit instead of next.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor.is_last()
    }

    /// Score of the answers so far; does not freeze anything.
    #[must_use]
    pub fn live_score(&self) -> Score {
        score(&self.questions, &self.answers)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            index: self.cursor.index(),
        }
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.seconds()
    }

    #[must_use]
    pub fn elapsed_counter(&self) -> ElapsedCounter {
        self.elapsed.clone()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    #[must_use]
    pub fn submission_phase(&self) -> SubmissionPhase {
        self.coordinator.phase()
    }

    #[must_use]
    pub fn last_submit_error(&self) -> Option<String> {
        self.coordinator.last_error()
    }

    /// Clear answers, rewind the cursor and the counter, and allow a new
    /// submission. The display name is kept.
    pub fn restart(&mut self) {
        self.answers.clear();
        self.cursor.reset();
        self.elapsed.reset();
        self.coordinator.reset();
    }

    /// Submit the current answers under the current display name.
    ///
    /// # Errors
    ///
    /// See `SubmissionCoordinator::submit`.
    pub async fn submit(&self) -> Result<SubmissionOutcome, SubmitError> {
        let outcome = self
            .coordinator
            .submit(self.quiz.id, &self.questions, &self.answers, &self.display_name)
            .await?;
        Ok(outcome)
    }
}
