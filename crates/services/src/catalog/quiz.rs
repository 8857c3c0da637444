use std::sync::Arc;

use quiz_core::model::{CategoryId, Quiz, QuizDraft, QuizId, QuizStatus, check_rating};
use rand::seq::IndexedRandom;
use storage::repository::{QuestionRepository, QuizRepository, StorageError};

use crate::Clock;
use crate::auth::{AuthProvider, require_admin};
use crate::error::CatalogError;

/// Thumbnails handed to quizzes created without one.
pub const DEFAULT_THUMBNAILS: [&str; 5] = [
    "https://images.unsplash.com/photo-1516979187457-637abb4f9353?auto=format&fit=crop&w=600&h=400&q=80",
    "https://images.unsplash.com/photo-1553877522-43269d4ea984?auto=format&fit=crop&w=600&h=400&q=80",
    "https://images.unsplash.com/photo-1546410531-bb4caa6b424d?auto=format&fit=crop&w=600&h=400&q=80",
    "https://images.unsplash.com/photo-1606326608606-aa0b62935f2b?auto=format&fit=crop&w=600&h=400&q=80",
    "https://images.unsplash.com/photo-1516321318423-f06f85e504b3?auto=format&fit=crop&w=600&h=400&q=80",
];

fn random_thumbnail() -> String {
    DEFAULT_THUMBNAILS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DEFAULT_THUMBNAILS[0])
        .to_string()
}

/// Lists, authors and duplicates quizzes.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    auth: Arc<dyn AuthProvider>,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            auth,
            quizzes,
            questions,
        }
    }

    /// Every quiz, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<Quiz>, CatalogError> {
        Ok(self.quizzes.list_quizzes(None).await?)
    }

    /// Quizzes that can be taken.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_published(&self) -> Result<Vec<Quiz>, CatalogError> {
        let mut quizzes = self.quizzes.list_quizzes(None).await?;
        quizzes.retain(Quiz::is_published);
        Ok(quizzes)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_by_category(&self, category: CategoryId) -> Result<Vec<Quiz>, CatalogError> {
        Ok(self.quizzes.list_quizzes(Some(category)).await?)
    }

    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn get(&self, id: QuizId) -> Result<Option<Quiz>, CatalogError> {
        Ok(self.quizzes.get_quiz(id).await?)
    }

    /// Create a quiz with zeroed counters.
    ///
    /// A missing thumbnail is replaced by one of `DEFAULT_THUMBNAILS`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Quiz` for invalid fields, and `CatalogError::Storage`
    /// if the category does not exist.
    pub async fn create(&self, mut draft: QuizDraft) -> Result<Quiz, CatalogError> {
        require_admin(self.auth.as_ref())?;
        if draft
            .thumbnail_url
            .as_deref()
            .is_none_or(|url| url.trim().is_empty())
        {
            draft.thumbnail_url = Some(random_thumbnail());
        }
        let quiz = self
            .quizzes
            .insert_quiz(draft.validate(self.clock.now())?)
            .await?;
        tracing::info!(quiz_id = %quiz.id, "quiz created");
        Ok(quiz)
    }

    /// Replace a quiz's details and stamp `last_updated`; counters are kept.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Quiz` for invalid fields, and `CatalogError::Storage`
    /// if the quiz does not exist.
    pub async fn update(&self, id: QuizId, draft: QuizDraft) -> Result<Quiz, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let existing = self.existing(id).await?;
        let updated = existing.with_details(draft.validate(self.clock.now())?);
        self.quizzes.update_quiz(&updated).await?;
        Ok(updated)
    }

    /// Publish or unpublish a quiz.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in, and
    /// `CatalogError::Storage` if the quiz does not exist.
    pub async fn set_status(&self, id: QuizId, status: QuizStatus) -> Result<Quiz, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let mut quiz = self.existing(id).await?;
        quiz.status = status;
        quiz.last_updated = self.clock.now();
        self.quizzes.update_quiz(&quiz).await?;
        Ok(quiz)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Quiz` outside 0 to 5, and `CatalogError::Storage` if
    /// the quiz does not exist.
    pub async fn set_rating(&self, id: QuizId, rating: f32) -> Result<Quiz, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let rating = check_rating(rating)?;
        let mut quiz = self.existing(id).await?;
        quiz.rating = rating;
        self.quizzes.update_quiz(&quiz).await?;
        Ok(quiz)
    }

    /// Delete a quiz and its questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in, and
    /// `CatalogError::Storage` if the quiz does not exist.
    pub async fn delete(&self, id: QuizId) -> Result<(), CatalogError> {
        require_admin(self.auth.as_ref())?;
        self.quizzes.delete_quiz(id).await?;
        tracing::info!(quiz_id = %id, "quiz deleted");
        Ok(())
    }

    /// Copy a quiz and all its questions into a new draft titled "… (Copy)".
    ///
    /// If any question fails to copy, the new quiz is deleted again and the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in, and
    /// `CatalogError::Storage` if the source quiz does not exist or a
    /// question cannot be copied.
    pub async fn duplicate(&self, id: QuizId) -> Result<Quiz, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let source = self.existing(id).await?;
        let mut copy = self
            .quizzes
            .insert_quiz(source.duplicate_draft().validate(self.clock.now())?)
            .await?;

        let copied = match self.copy_questions(source.id, copy.id).await {
            Ok(copied) => copied,
            Err(e) => {
                if let Err(cleanup) = self.quizzes.delete_quiz(copy.id).await {
                    tracing::warn!(copy = %copy.id, error = %cleanup, "failed to remove partial copy");
                }
                return Err(e);
            }
        };
        copy.questions_count = copied;
        tracing::info!(source = %source.id, copy = %copy.id, questions = copied, "quiz duplicated");
        Ok(copy)
    }

    async fn copy_questions(&self, from: QuizId, to: QuizId) -> Result<u32, CatalogError> {
        let questions = self.questions.list_questions(from).await?;
        for question in &questions {
            let draft = question.to_draft(to).validate()?;
            self.questions.insert_question(draft).await?;
        }

        let copied = i32::try_from(questions.len()).unwrap_or(i32::MAX);
        if copied > 0 {
            self.quizzes.adjust_questions_count(to, copied).await?;
        }
        Ok(u32::try_from(copied).unwrap_or(u32::MAX))
    }

    async fn existing(&self, id: QuizId) -> Result<Quiz, CatalogError> {
        Ok(self
            .quizzes
            .get_quiz(id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }
}
