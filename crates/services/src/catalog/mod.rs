//! Admin-facing catalog management: categories, quizzes and their questions.

mod category;
mod question;
mod quiz;

pub use category::CategoryService;
pub use question::QuestionService;
pub use quiz::{DEFAULT_THUMBNAILS, QuizService};
