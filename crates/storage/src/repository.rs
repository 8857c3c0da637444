use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    Category, CategoryId, Question, QuestionId, Quiz, QuizId, Submission, SubmissionId,
    SubmissionSnapshot, ValidatedCategory, ValidatedQuestion, ValidatedQuiz,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Persist a new category and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the category cannot be stored.
    async fn insert_category(&self, category: ValidatedCategory) -> Result<Category, StorageError>;

    /// Overwrite name and icon of an existing category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist.
    async fn update_category(&self, category: &Category) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, `StorageError::Conflict`
    /// while quizzes still reference the category.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError>;

    /// All categories ordered by id, with live quiz counts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn insert_quiz(&self, quiz: ValidatedQuiz) -> Result<Quiz, StorageError>;

    /// Overwrite the editable details of a quiz.
    ///
    /// `attempts` and `questions_count` are left untouched; they only change
    /// through the atomic counter operations.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn update_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Delete a quiz together with its questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// Quizzes ordered by id, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quizzes(&self, category: Option<CategoryId>) -> Result<Vec<Quiz>, StorageError>;

    /// Atomically add one to the quiz's attempt counter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn increment_attempts(&self, id: QuizId) -> Result<(), StorageError>;

    /// Atomically shift the question counter by `delta`, never below zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn adjust_questions_count(&self, id: QuizId, delta: i32) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning quiz does not exist.
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Questions of a quiz in authoring order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a completed attempt as a single insert.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn create_submission(
        &self,
        snapshot: &SubmissionSnapshot,
    ) -> Result<Submission, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError>;

    /// Most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_recent_submissions(&self, limit: u32) -> Result<Vec<Submission>, StorageError>;

    /// Most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_submissions_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<Submission>, StorageError>;

    /// Submissions completed in `[from, until]`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_submissions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Submission>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_submissions(&self) -> Result<u64, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    categories: BTreeMap<CategoryId, Category>,
    quizzes: BTreeMap<QuizId, Quiz>,
    questions: BTreeMap<QuestionId, Question>,
    submissions: BTreeMap<SubmissionId, Submission>,
    next_id: u64,
}

impl InMemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn quiz_count(&self, category: CategoryId) -> u32 {
        let count = self
            .quizzes
            .values()
            .filter(|q| q.category_id == category)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn recent(&self, filter: impl Fn(&Submission) -> bool) -> Vec<Submission> {
        let mut out: Vec<Submission> = self
            .submissions
            .values()
            .filter(|s| filter(s))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.snapshot
                .completed_at()
                .cmp(&a.snapshot.completed_at())
                .then(b.id.cmp(&a.id))
        });
        out
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// One lock guards every table so cascades and counters stay atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository {
    async fn insert_category(&self, category: ValidatedCategory) -> Result<Category, StorageError> {
        let mut guard = self.lock()?;
        let id = CategoryId::new(guard.next_id());
        let category = category.assign_id(id);
        guard.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, category: &Category) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let existing = guard
            .categories
            .get_mut(&category.id)
            .ok_or(StorageError::NotFound)?;
        existing.name.clone_from(&category.name);
        existing.icon.clone_from(&category.icon);
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        if guard.quiz_count(id) > 0 {
            return Err(StorageError::Conflict);
        }
        guard.categories.remove(&id);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.categories.get(&id).cloned().map(|mut c| {
            c.quiz_count = guard.quiz_count(id);
            c
        }))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .categories
            .values()
            .cloned()
            .map(|mut c| {
                c.quiz_count = guard.quiz_count(c.id);
                c
            })
            .collect())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: ValidatedQuiz) -> Result<Quiz, StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&quiz.category_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuizId::new(guard.next_id());
        let quiz = quiz.assign_id(id);
        guard.quizzes.insert(id, quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&quiz.category_id) {
            return Err(StorageError::NotFound);
        }
        let existing = guard.quizzes.get_mut(&quiz.id).ok_or(StorageError::NotFound)?;
        let (attempts, questions_count) = (existing.attempts, existing.questions_count);
        *existing = Quiz {
            attempts,
            questions_count,
            ..quiz.clone()
        };
        Ok(())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.quizzes.remove(&id).ok_or(StorageError::NotFound)?;
        guard.questions.retain(|_, q| q.quiz_id() != id);
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, category: Option<CategoryId>) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .quizzes
            .values()
            .filter(|q| category.is_none_or(|c| q.category_id == c))
            .cloned()
            .collect())
    }

    async fn increment_attempts(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let quiz = guard.quizzes.get_mut(&id).ok_or(StorageError::NotFound)?;
        quiz.attempts = quiz.attempts.saturating_add(1);
        Ok(())
    }

    async fn adjust_questions_count(&self, id: QuizId, delta: i32) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let quiz = guard.quizzes.get_mut(&id).ok_or(StorageError::NotFound)?;
        quiz.questions_count = quiz.questions_count.saturating_add_signed(delta);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&question.quiz_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuestionId::new(guard.next_id());
        let question = question.assign_id(id);
        guard.questions.insert(id, question.clone());
        Ok(question)
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let existing = guard
            .questions
            .get_mut(&question.id())
            .ok_or(StorageError::NotFound)?;
        *existing = question.clone();
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.questions.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        Ok(self.lock()?.questions.get(&id).cloned())
    }

    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .filter(|q| q.quiz_id() == quiz_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn create_submission(
        &self,
        snapshot: &SubmissionSnapshot,
    ) -> Result<Submission, StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&snapshot.quiz_id()) {
            return Err(StorageError::NotFound);
        }
        let id = SubmissionId::new(guard.next_id());
        let submission = Submission::new(id, snapshot.clone());
        guard.submissions.insert(id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        Ok(self.lock()?.submissions.get(&id).cloned())
    }

    async fn list_recent_submissions(&self, limit: u32) -> Result<Vec<Submission>, StorageError> {
        let mut out = self.lock()?.recent(|_| true);
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn list_submissions_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<Submission>, StorageError> {
        let mut out = self.lock()?.recent(|s| s.snapshot.quiz_id() == quiz_id);
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }

    async fn list_submissions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Submission>, StorageError> {
        Ok(self.lock()?.recent(|s| {
            let at = s.snapshot.completed_at();
            at >= from && at <= until
        }))
    }

    async fn count_submissions(&self) -> Result<u64, StorageError> {
        Ok(self.lock()?.submissions.len() as u64)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub categories: Arc<dyn CategoryRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: CategoryRepository
            + QuizRepository
            + QuestionRepository
            + SubmissionRepository
            + Clone
            + 'static,
    {
        let categories: Arc<dyn CategoryRepository> = Arc::new(repo.clone());
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionRepository> = Arc::new(repo);
        Self {
            categories,
            quizzes,
            questions,
            submissions,
        }
    }
}
