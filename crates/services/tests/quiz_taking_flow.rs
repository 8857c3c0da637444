use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerOption, CategoryDraft, QuestionDraft, QuestionId, QuizDraft, QuizId, Response, Score,
    Submission, SubmissionId, SubmissionSnapshot,
};
use quiz_core::time::fixed_now;
use services::{
    AuthProvider, Clock, InMemoryAuthProvider, QuizTakingService, SessionError, SubmissionPhase,
    SubmitError, ValidationError,
};
use storage::repository::{
    CategoryRepository, InMemoryRepository, QuestionRepository, QuizRepository, StorageError,
    SubmissionRepository,
};
use tokio::sync::Notify;

/// A published quiz with a 10-point multiple-choice and a 5-point true/false.
async fn seeded_repo() -> (InMemoryRepository, QuizId) {
    let repo = InMemoryRepository::new();
    let now = fixed_now();
    let category = repo
        .insert_category(CategoryDraft::new("General", "book").validate(now).unwrap())
        .await
        .unwrap();
    let quiz = repo
        .insert_quiz(
            QuizDraft::new("Basics", category.id)
                .published()
                .validate(now)
                .unwrap(),
        )
        .await
        .unwrap();
    repo.insert_question(
        QuestionDraft::multiple_choice(
            quiz.id,
            "Which keyword declares a mutable binding?",
            vec![
                AnswerOption::new(1, "mut", true),
                AnswerOption::new(2, "var", false),
                AnswerOption::new(3, "let!", false),
            ],
            10,
        )
        .validate()
        .unwrap(),
    )
    .await
    .unwrap();
    repo.insert_question(
        QuestionDraft::true_false(quiz.id, "Rust has a garbage collector", false, 5)
            .validate()
            .unwrap(),
    )
    .await
    .unwrap();
    (repo, quiz.id)
}

fn service_over(
    repo: &InMemoryRepository,
    submissions: Arc<dyn SubmissionRepository>,
) -> QuizTakingService {
    QuizTakingService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        submissions,
    )
    .with_tick(None)
}

fn service(repo: &InMemoryRepository) -> QuizTakingService {
    service_over(repo, Arc::new(repo.clone()))
}

async fn wait_for_attempts(repo: &InMemoryRepository, quiz_id: QuizId, expected: u32) {
    for _ in 0..100 {
        if repo.get_quiz(quiz_id).await.unwrap().unwrap().attempts == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("attempt counter never reached {expected}");
}

#[tokio::test]
async fn one_right_one_wrong_scores_ten_of_fifteen() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();

    session.answer_current(Response::choice(1));
    assert!(session.advance());
    assert!(session.is_last());
    // option 1 is "True"; the statement is false
    session.answer_current(Response::choice(1));
    session.set_display_name("  Ada ");

    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(10, 15));
    assert_eq!(outcome.answers.len(), 2);
    assert_eq!(session.submission_phase(), SubmissionPhase::Completed);

    let stored = repo.get_submission(outcome.submission_id).await.unwrap().unwrap();
    assert_eq!(stored.snapshot.display_name(), "Ada");
    assert_eq!(stored.snapshot.score(), Score::new(10, 15));
    assert_eq!(stored.snapshot.completed_at(), fixed_now());

    wait_for_attempts(&repo, quiz_id, 1).await;
}

#[tokio::test]
async fn nothing_answered_scores_zero() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();
    session.set_display_name("Grace");

    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(0, 15));
    assert!(outcome.answers.is_empty());
}

#[tokio::test]
async fn blank_name_never_reaches_storage() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();
    session.answer_current(Response::choice(1));
    session.set_display_name("   ");

    let err = session.submit().await.unwrap_err();
    assert_eq!(err, SubmitError::Validation(ValidationError::EmptyDisplayName));
    assert_eq!(session.submission_phase(), SubmissionPhase::Idle);
    assert_eq!(repo.count_submissions().await.unwrap(), 0);
    assert_eq!(session.answers().len(), 1);
}

/// Rejects the first `failures` inserts, then delegates.
struct FlakySubmissions {
    inner: InMemoryRepository,
    failures: AtomicUsize,
}

#[async_trait]
impl SubmissionRepository for FlakySubmissions {
    async fn create_submission(
        &self,
        snapshot: &SubmissionSnapshot,
    ) -> Result<Submission, StorageError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StorageError::Connection("network unreachable".into()));
        }
        self.inner.create_submission(snapshot).await
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        self.inner.get_submission(id).await
    }

    async fn list_recent_submissions(&self, limit: u32) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_recent_submissions(limit).await
    }

    async fn list_submissions_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_submissions_for_quiz(quiz_id, limit).await
    }

    async fn list_submissions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_submissions_between(from, until).await
    }

    async fn count_submissions(&self) -> Result<u64, StorageError> {
        self.inner.count_submissions().await
    }
}

#[tokio::test]
async fn rejected_submit_keeps_answers_and_can_be_retried() {
    let (repo, quiz_id) = seeded_repo().await;
    let flaky = Arc::new(FlakySubmissions {
        inner: repo.clone(),
        failures: AtomicUsize::new(1),
    });
    let mut session = service_over(&repo, flaky)
        .start_session(quiz_id)
        .await
        .unwrap();
    session.answer_current(Response::choice(1));
    session.set_display_name("Linus");

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Persistence { ref message } if message.contains("network")));
    assert_eq!(session.submission_phase(), SubmissionPhase::Idle);
    assert_eq!(session.answers().len(), 1);
    assert!(session.last_submit_error().is_some());

    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(10, 15));
    assert_eq!(repo.count_submissions().await.unwrap(), 1);
    wait_for_attempts(&repo, quiz_id, 1).await;
}

/// Holds every insert until released, counting calls.
struct GatedSubmissions {
    inner: InMemoryRepository,
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl SubmissionRepository for GatedSubmissions {
    async fn create_submission(
        &self,
        snapshot: &SubmissionSnapshot,
    ) -> Result<Submission, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.inner.create_submission(snapshot).await
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        self.inner.get_submission(id).await
    }

    async fn list_recent_submissions(&self, limit: u32) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_recent_submissions(limit).await
    }

    async fn list_submissions_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_submissions_for_quiz(quiz_id, limit).await
    }

    async fn list_submissions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Submission>, StorageError> {
        self.inner.list_submissions_between(from, until).await
    }

    async fn count_submissions(&self) -> Result<u64, StorageError> {
        self.inner.count_submissions().await
    }
}

#[tokio::test]
async fn second_submit_while_in_flight_is_turned_away() {
    let (repo, quiz_id) = seeded_repo().await;
    let gated = Arc::new(GatedSubmissions {
        inner: repo.clone(),
        gate: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let mut session = service_over(&repo, Arc::clone(&gated) as Arc<dyn SubmissionRepository>)
        .start_session(quiz_id)
        .await
        .unwrap();
    session.set_display_name("Barbara");

    let (first, second) = tokio::join!(session.submit(), async {
        let second = session.submit().await;
        gated.gate.notify_one();
        second
    });

    assert_eq!(second.unwrap_err(), SubmitError::InProgress);
    assert!(first.is_ok());
    assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
    assert_eq!(repo.count_submissions().await.unwrap(), 1);
}

#[tokio::test]
async fn restart_allows_a_fresh_attempt() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();
    session.set_display_name("Ada");
    session.answer_current(Response::choice(2));
    session.submit().await.unwrap();
    assert_eq!(session.submit().await.unwrap_err(), SubmitError::AlreadySubmitted);

    session.restart();
    assert!(session.answers().is_empty());
    assert_eq!(session.current_index(), 0);
    session.answer_current(Response::choice(1));
    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(10, 15));
    assert_eq!(repo.count_submissions().await.unwrap(), 2);
    wait_for_attempts(&repo, quiz_id, 2).await;
}

#[tokio::test]
async fn submission_carries_signed_in_user() {
    let (repo, quiz_id) = seeded_repo().await;
    let auth = Arc::new(InMemoryAuthProvider::new(None));
    let account = auth.sign_up("ada@example.com", "secret1").await.unwrap();

    let mut session = service(&repo)
        .with_auth(auth as Arc<dyn AuthProvider>)
        .start_session(quiz_id)
        .await
        .unwrap();
    session.set_display_name("Ada");
    let outcome = session.submit().await.unwrap();

    let stored = repo.get_submission(outcome.submission_id).await.unwrap().unwrap();
    assert_eq!(stored.snapshot.user_id(), Some(account.user_id));
}

#[tokio::test]
async fn draft_missing_and_empty_quizzes_are_unavailable() {
    let (repo, quiz_id) = seeded_repo().await;
    let svc = service(&repo);

    let missing = svc.start_session(QuizId::new(404)).await.err().unwrap();
    assert!(matches!(missing, SessionError::Unavailable(id) if id == QuizId::new(404)));

    let mut quiz = repo.get_quiz(quiz_id).await.unwrap().unwrap();
    let empty = repo
        .insert_quiz(
            QuizDraft::new("Empty", quiz.category_id)
                .published()
                .validate(fixed_now())
                .unwrap(),
        )
        .await
        .unwrap();
    let err = svc.start_session(empty.id).await.err().unwrap();
    assert!(matches!(err, SessionError::Unavailable(_)));

    quiz.status = quiz_core::model::QuizStatus::Draft;
    repo.update_quiz(&quiz).await.unwrap();
    let err = svc.start_session(quiz_id).await.err().unwrap();
    assert!(matches!(err, SessionError::Unavailable(_)));
}

#[tokio::test]
async fn unknown_question_answers_are_ignored() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();
    assert!(
        session
            .record_answer(QuestionId::new(9_999), Response::choice(1))
            .is_none()
    );
    assert!(session.answers().is_empty());
}

#[tokio::test]
async fn unreadable_answer_replaces_an_earlier_right_one() {
    let (repo, quiz_id) = seeded_repo().await;
    let mut session = service(&repo).start_session(quiz_id).await.unwrap();

    assert!(session.answer_current(Response::choice(1)).unwrap().is_correct());
    assert_eq!(session.live_score(), Score::new(10, 15));

    let record = session.answer_current(Response::text("mut?")).unwrap();
    assert!(!record.is_correct());
    assert_eq!(record.points(), 0);
    assert_eq!(record.selected_option(), None);
    assert_eq!(session.answers().len(), 1);
    assert_eq!(session.live_score(), Score::new(0, 15));

    session.set_display_name("Ada");
    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(0, 15));
}

#[tokio::test]
async fn restart_during_submit_leaves_the_new_attempt_open() {
    let (repo, quiz_id) = seeded_repo().await;
    let gated = Arc::new(GatedSubmissions {
        inner: repo.clone(),
        gate: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let mut session = service_over(&repo, Arc::clone(&gated) as Arc<dyn SubmissionRepository>)
        .start_session(quiz_id)
        .await
        .unwrap();
    session.set_display_name("Ada");
    session.answer_current(Response::choice(2));

    let abandoned = tokio::time::timeout(Duration::from_millis(20), session.submit()).await;
    assert!(abandoned.is_err());
    assert_eq!(session.submission_phase(), SubmissionPhase::Submitting);

    session.restart();
    assert_eq!(session.submission_phase(), SubmissionPhase::Idle);

    gated.gate.notify_one();
    for _ in 0..100 {
        if repo.count_submissions().await.unwrap() == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(repo.count_submissions().await.unwrap(), 1);
    assert_eq!(session.submission_phase(), SubmissionPhase::Idle);

    session.answer_current(Response::choice(1));
    gated.gate.notify_one();
    let outcome = session.submit().await.unwrap();
    assert_eq!(outcome.score, Score::new(10, 15));
    assert_eq!(session.submission_phase(), SubmissionPhase::Completed);
    assert_eq!(gated.calls.load(Ordering::SeqCst), 2);
    assert_eq!(repo.count_submissions().await.unwrap(), 2);
    wait_for_attempts(&repo, quiz_id, 2).await;
}
