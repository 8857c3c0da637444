//! Pure building blocks of a quiz-taking session.

mod answers;
mod cursor;
mod elapsed;
mod scorer;

pub use answers::AnswerStore;
pub use cursor::NavigationCursor;
pub use elapsed::ElapsedCounter;
pub use scorer::score;
