use chrono::Duration;
use quiz_core::model::{
    AnswerOption, CategoryDraft, QuestionDraft, QuestionKind, Quiz, QuizDraft, QuizStatus,
    Response, Score, SubmissionSnapshot,
};
use quiz_core::session::AnswerStore;
use quiz_core::time::fixed_now;
use storage::repository::{
    CategoryRepository, QuestionRepository, QuizRepository, StorageError, SubmissionRepository,
};
use storage::sqlite::SqliteRepository;
use uuid::Uuid;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn seed_quiz(repo: &SqliteRepository) -> Quiz {
    let category = repo
        .insert_category(
            CategoryDraft::new("Programming", "code")
                .validate(fixed_now())
                .unwrap(),
        )
        .await
        .unwrap();
    let mut draft = QuizDraft::new("Rust Basics", category.id).published();
    draft.thumbnail_url = Some("https://example.com/rust.png".into());
    repo.insert_quiz(draft.validate(fixed_now()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_quiz_and_questions() {
    let repo = connect("memdb_roundtrip").await;
    let quiz = seed_quiz(&repo).await;

    let mc = repo
        .insert_question(
            QuestionDraft::multiple_choice(
                quiz.id,
                "Pick mut",
                vec![
                    AnswerOption::new(1, "mut", true),
                    AnswerOption::new(2, "var", false),
                ],
                10,
            )
            .with_explanation("Bindings are immutable by default.")
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();
    let essay = repo
        .insert_question(
            QuestionDraft::descriptive(quiz.id, "Explain borrowing", "references", 15)
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let fetched = repo.get_quiz(quiz.id).await.unwrap().expect("quiz");
    assert_eq!(fetched.status, QuizStatus::Published);
    assert_eq!(
        fetched.thumbnail_url.as_ref().map(url::Url::as_str),
        Some("https://example.com/rust.png")
    );

    let questions = repo.list_questions(quiz.id).await.unwrap();
    assert_eq!(questions, vec![mc.clone(), essay.clone()]);
    assert_eq!(questions[0].explanation(), Some("Bindings are immutable by default."));
    assert_eq!(questions[1].kind(), QuestionKind::Descriptive);
    assert!(questions[1].options().is_empty());
}

#[tokio::test]
async fn sqlite_counters_are_atomic_and_clamped() {
    let repo = connect("memdb_counters").await;
    let quiz = seed_quiz(&repo).await;

    repo.increment_attempts(quiz.id).await.unwrap();
    repo.increment_attempts(quiz.id).await.unwrap();
    repo.adjust_questions_count(quiz.id, 3).await.unwrap();
    repo.adjust_questions_count(quiz.id, -10).await.unwrap();

    let mut edited = repo.get_quiz(quiz.id).await.unwrap().unwrap();
    assert_eq!(edited.attempts, 2);
    assert_eq!(edited.questions_count, 0);

    edited.title = "Rust Basics II".into();
    edited.attempts = 99;
    repo.update_quiz(&edited).await.unwrap();
    let stored = repo.get_quiz(quiz.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Rust Basics II");
    assert_eq!(stored.attempts, 2);

    let missing = repo
        .increment_attempts(quiz_core::model::QuizId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_delete_quiz_cascades_questions_and_frees_category() {
    let repo = connect("memdb_cascade").await;
    let quiz = seed_quiz(&repo).await;
    let q = repo
        .insert_question(
            QuestionDraft::true_false(quiz.id, "Rust has a GC", false, 5)
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let in_use = repo.delete_category(quiz.category_id).await.unwrap_err();
    assert!(matches!(in_use, StorageError::Conflict));
    let category = repo.get_category(quiz.category_id).await.unwrap().unwrap();
    assert_eq!(category.quiz_count, 1);

    repo.delete_quiz(quiz.id).await.unwrap();
    assert!(repo.get_question(q.id()).await.unwrap().is_none());
    repo.delete_category(quiz.category_id).await.unwrap();
    assert!(repo.list_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_stores_submission_snapshot_with_answers() {
    let repo = connect("memdb_submissions").await;
    let quiz = seed_quiz(&repo).await;
    let tf = repo
        .insert_question(
            QuestionDraft::true_false(quiz.id, "Slices are borrowed", true, 5)
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let mut answers = AnswerStore::new();
    answers.record_answer(&tf, Response::choice(1));
    let user = Uuid::new_v4();

    for minutes in [0, 10] {
        let snapshot = SubmissionSnapshot::new(
            quiz.id,
            Some(user),
            "Ada",
            Score::new(5, 5),
            fixed_now() + Duration::minutes(minutes),
            answers.to_submitted(),
        )
        .unwrap();
        repo.create_submission(&snapshot).await.unwrap();
    }

    let recent = repo.list_recent_submissions(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].snapshot.completed_at() > recent[1].snapshot.completed_at());
    assert_eq!(recent[0].snapshot.user_id(), Some(user));
    assert_eq!(recent[0].snapshot.answers(), answers.to_submitted().as_slice());

    let window = repo
        .list_submissions_between(fixed_now(), fixed_now() + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(window.len(), 1);

    let for_quiz = repo.list_submissions_for_quiz(quiz.id, 1).await.unwrap();
    assert_eq!(for_quiz.len(), 1);
    assert_eq!(repo.count_submissions().await.unwrap(), 2);

    let fetched = repo.get_submission(recent[1].id).await.unwrap().unwrap();
    assert_eq!(fetched, recent[1]);
}

#[tokio::test]
async fn sqlite_rejects_children_of_missing_parents() {
    let repo = connect("memdb_parents").await;
    let orphan = QuestionDraft::true_false(quiz_core::model::QuizId::new(42), "?", true, 1)
        .validate()
        .unwrap();
    assert!(matches!(
        repo.insert_question(orphan).await.unwrap_err(),
        StorageError::NotFound
    ));

    let orphan_quiz = QuizDraft::new("Lost", quiz_core::model::CategoryId::new(42))
        .validate(fixed_now())
        .unwrap();
    assert!(matches!(
        repo.insert_quiz(orphan_quiz).await.unwrap_err(),
        StorageError::NotFound
    ));
}
