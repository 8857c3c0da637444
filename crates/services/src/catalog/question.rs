use std::sync::Arc;

use quiz_core::model::{Question, QuestionDraft, QuestionId, QuizId};
use storage::repository::{QuestionRepository, QuizRepository, StorageError};

use crate::auth::{AuthProvider, require_admin};
use crate::error::CatalogError;

/// Authoring of the questions of a quiz.
///
/// Keeps the quiz's `questions_count` in step with inserts and deletes.
#[derive(Clone)]
pub struct QuestionService {
    auth: Arc<dyn AuthProvider>,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            auth,
            quizzes,
            questions,
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Question>, CatalogError> {
        Ok(self.questions.list_questions(quiz_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Question` if the draft breaks authoring rules, and
    /// `CatalogError::Storage` if the quiz does not exist.
    pub async fn add(&self, draft: QuestionDraft) -> Result<Question, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let question = self.questions.insert_question(draft.validate()?).await?;
        self.quizzes
            .adjust_questions_count(question.quiz_id(), 1)
            .await?;
        Ok(question)
    }

    /// Replace a question's content; it stays on its quiz.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Question` for invalid content, and
    /// `CatalogError::Storage` if the question does not exist.
    pub async fn update(
        &self,
        id: QuestionId,
        mut draft: QuestionDraft,
    ) -> Result<Question, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let existing = self
            .questions
            .get_question(id)
            .await?
            .ok_or(StorageError::NotFound)?;
        draft.quiz_id = existing.quiz_id();
        let updated = draft.validate()?.assign_id(existing.id());
        self.questions.update_question(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in, and
    /// `CatalogError::Storage` if the question does not exist.
    pub async fn delete(&self, id: QuestionId) -> Result<(), CatalogError> {
        require_admin(self.auth.as_ref())?;
        let existing = self
            .questions
            .get_question(id)
            .await?
            .ok_or(StorageError::NotFound)?;
        self.questions.delete_question(id).await?;
        self.quizzes
            .adjust_questions_count(existing.quiz_id(), -1)
            .await?;
        Ok(())
    }
}
