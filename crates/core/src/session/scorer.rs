use crate::model::{Question, Score};
use crate::session::answers::AnswerStore;

/// Aggregate points for a question sequence.
///
/// `total` counts every question; `earned` counts only questions whose
/// record is correct. Records for questions outside `questions` are ignored.
/// Pure, so it doubles as a live preview.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerStore) -> Score {
    questions.iter().fold(Score::default(), |acc, question| {
        let earned = answers
            .get(question.id())
            .filter(|record| record.is_correct())
            .map_or(0, |record| record.points());
        Score {
            earned: acc.earned.saturating_add(earned),
            total: acc.total.saturating_add(question.points()),
        }
    })
}
