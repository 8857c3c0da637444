use std::sync::Arc;

use chrono::Duration;
use quiz_core::model::{AnswerOption, QuestionDraft, QuizDraft, QuizStatus, Response};
use quiz_core::time::fixed_now;
use services::{
    AppServices, AuthError, AuthProvider, CatalogError, Clock, InMemoryAuthProvider,
};
use storage::repository::{Storage, StorageError};

const ADMIN: &str = "admin@quiz.dev";

async fn admin_services(db: &str) -> (AppServices, Arc<InMemoryAuthProvider>) {
    let storage = Storage::sqlite(&format!("sqlite:file:{db}?mode=memory&cache=shared"))
        .await
        .expect("connect sqlite");
    let auth = Arc::new(InMemoryAuthProvider::new(Some(ADMIN)));
    auth.sign_up(ADMIN, "admin-password").await.unwrap();
    let services = AppServices::from_storage(
        &storage,
        Clock::fixed(fixed_now()),
        Arc::clone(&auth) as Arc<dyn AuthProvider>,
    );
    (services, auth)
}

#[tokio::test]
async fn admin_builds_duplicates_and_deletes_a_quiz() {
    let (services, _auth) = admin_services("memdb_admin_flow").await;
    let category = services
        .categories()
        .create("Programming", "code")
        .await
        .expect("create category");

    let quiz = services
        .quizzes()
        .create(QuizDraft::new("Rust Basics", category.id))
        .await
        .expect("create quiz");
    assert_eq!(quiz.status, QuizStatus::Draft);
    assert_eq!(quiz.questions_count, 0);
    assert!(quiz.thumbnail_url.is_some());

    let questions = services.questions();
    questions
        .add(QuestionDraft::multiple_choice(
            quiz.id,
            "Pick the borrow operator",
            vec![
                AnswerOption::new(1, "&", true),
                AnswerOption::new(2, "*", false),
            ],
            10,
        ))
        .await
        .unwrap();
    let tf = questions
        .add(QuestionDraft::true_false(quiz.id, "Moves copy the heap", false, 5))
        .await
        .unwrap();

    let stored = services.quizzes().get(quiz.id).await.unwrap().unwrap();
    assert_eq!(stored.questions_count, 2);

    let copy = services.quizzes().duplicate(quiz.id).await.unwrap();
    assert_eq!(copy.title, "Rust Basics (Copy)");
    assert_eq!(copy.status, QuizStatus::Draft);
    assert_eq!(copy.attempts, 0);
    assert_eq!(copy.questions_count, 2);
    assert_eq!(questions.list_for_quiz(copy.id).await.unwrap().len(), 2);

    questions.delete(tf.id()).await.unwrap();
    let stored = services.quizzes().get(quiz.id).await.unwrap().unwrap();
    assert_eq!(stored.questions_count, 1);

    let published = services
        .quizzes()
        .set_status(quiz.id, QuizStatus::Published)
        .await
        .unwrap();
    assert!(published.is_published());
    assert_eq!(services.quizzes().list_published().await.unwrap().len(), 1);

    let blocked = services.categories().delete(category.id).await.unwrap_err();
    assert!(matches!(blocked, CatalogError::Storage(StorageError::Conflict)));

    services.quizzes().delete(quiz.id).await.unwrap();
    services.quizzes().delete(copy.id).await.unwrap();
    assert!(questions.list_for_quiz(quiz.id).await.unwrap().is_empty());
    services.categories().delete(category.id).await.unwrap();
}

#[tokio::test]
async fn catalog_mutations_require_admin() {
    let (services, auth) = admin_services("memdb_admin_guard").await;
    auth.sign_out().await.unwrap();

    let err = services.categories().create("Math", "sigma").await.unwrap_err();
    assert!(matches!(err, CatalogError::Auth(AuthError::NotSignedIn)));

    auth.sign_up("student@quiz.dev", "student-pw").await.unwrap();
    let err = services.categories().create("Math", "sigma").await.unwrap_err();
    assert!(matches!(err, CatalogError::Auth(AuthError::Forbidden)));

    assert!(services.categories().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let (services, _auth) = admin_services("memdb_admin_rating").await;
    let category = services.categories().create("Science", "flask").await.unwrap();
    let quiz = services
        .quizzes()
        .create(QuizDraft::new("Physics", category.id))
        .await
        .unwrap();

    let err = services.quizzes().set_rating(quiz.id, 7.5).await.unwrap_err();
    assert!(matches!(err, CatalogError::Quiz(_)));
    let rated = services.quizzes().set_rating(quiz.id, 4.5).await.unwrap();
    assert!((rated.rating - 4.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn dashboard_summarizes_submissions() {
    let (services, _auth) = admin_services("memdb_admin_dashboard").await;
    let category = services.categories().create("General", "book").await.unwrap();
    let quiz = services
        .quizzes()
        .create(QuizDraft::new("Trivia", category.id).published())
        .await
        .unwrap();
    services
        .questions()
        .add(QuestionDraft::true_false(quiz.id, "The sky is blue", true, 5))
        .await
        .unwrap();

    let taking = services.quiz_taking().as_ref().clone().with_tick(None);
    for name in ["Ada", "Grace", "Ada"] {
        let mut session = taking.start_session(quiz.id).await.unwrap();
        session.answer_current(Response::choice(1));
        session.set_display_name(name);
        session.submit().await.unwrap();
    }

    let stats = services
        .analytics()
        .dashboard(fixed_now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(stats.total_quizzes, 1);
    assert_eq!(stats.total_submissions, 3);
    assert_eq!(stats.unique_participants, 2);
    assert_eq!(stats.recent.len(), 3);
    assert_eq!(stats.recent[0].quiz_title, "Trivia");
    assert_eq!(stats.daily_activity.len(), 7);
    assert_eq!(stats.daily_activity.last().unwrap().submissions, 3);
    assert_eq!(stats.daily_activity[0].submissions, 0);

    let participants = services
        .analytics()
        .participants(fixed_now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(participants.len(), 2);
    let ada = participants.iter().find(|p| p.display_name == "Ada").unwrap();
    assert_eq!(ada.attempts, 2);
}
