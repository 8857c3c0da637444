use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::answer::AnswerRecord;
use crate::model::ids::{OptionId, QuestionId, QuizId, SubmissionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error("earned score ({earned}) exceeds the maximum ({total})")]
    ScoreOutOfRange { earned: u32, total: u32 },
}

/// Earned and maximum points of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub earned: u32,
    pub total: u32,
}

impl Score {
    #[must_use]
    pub fn new(earned: u32, total: u32) -> Self {
        Self { earned, total }
    }

    /// Whole-number percentage, 0 when the quiz is worth nothing.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = u64::from(self.earned) * 100 / u64::from(self.total);
        u32::try_from(pct).unwrap_or(u32::MAX)
    }
}

/// Serializable form of an answer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<OptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    pub is_correct: bool,
    pub points: u32,
}

impl SubmittedAnswer {
    #[must_use]
    pub fn from_record(question_id: QuestionId, record: &AnswerRecord) -> Self {
        Self {
            question_id,
            selected_option_id: record.selected_option(),
            answer_text: record.text().map(str::to_owned),
            is_correct: record.is_correct(),
            points: record.points(),
        }
    }
}

/// Immutable snapshot of a completed session, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSnapshot {
    quiz_id: QuizId,
    user_id: Option<Uuid>,
    display_name: String,
    score: Score,
    completed_at: DateTime<Utc>,
    answers: Vec<SubmittedAnswer>,
}

impl SubmissionSnapshot {
    /// Freeze a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::EmptyDisplayName` if the trimmed name is empty,
    /// or `SubmissionError::ScoreOutOfRange` if `earned > total`.
    pub fn new(
        quiz_id: QuizId,
        user_id: Option<Uuid>,
        display_name: &str,
        score: Score,
        completed_at: DateTime<Utc>,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<Self, SubmissionError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(SubmissionError::EmptyDisplayName);
        }
        if score.earned > score.total {
            return Err(SubmissionError::ScoreOutOfRange {
                earned: score.earned,
                total: score.total,
            });
        }
        Ok(Self {
            quiz_id,
            user_id,
            display_name: display_name.to_string(),
            score,
            completed_at,
            answers,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn answers(&self) -> &[SubmittedAnswer] {
        &self.answers
    }
}

/// A snapshot after the persistence layer stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: SubmissionId,
    pub snapshot: SubmissionSnapshot,
}

impl Submission {
    #[must_use]
    pub fn new(id: SubmissionId, snapshot: SubmissionSnapshot) -> Self {
        Self { id, snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn snapshot_trims_display_name() {
        let snap = SubmissionSnapshot::new(
            QuizId::new(1),
            None,
            "  Ada  ",
            Score::new(3, 5),
            fixed_now(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(snap.display_name(), "Ada");
    }

    #[test]
    fn snapshot_rejects_blank_name_and_bad_score() {
        let blank = SubmissionSnapshot::new(
            QuizId::new(1),
            None,
            "   ",
            Score::default(),
            fixed_now(),
            Vec::new(),
        );
        assert_eq!(blank.unwrap_err(), SubmissionError::EmptyDisplayName);

        let over = SubmissionSnapshot::new(
            QuizId::new(1),
            None,
            "Ada",
            Score::new(6, 5),
            fixed_now(),
            Vec::new(),
        );
        assert!(matches!(over, Err(SubmissionError::ScoreOutOfRange { .. })));
    }

    #[test]
    fn submitted_answer_matches_stored_json_shape() {
        let record = AnswerRecord::Choice {
            option_id: Some(OptionId::new(2)),
            is_correct: false,
            points: 0,
        };
        let answer = SubmittedAnswer::from_record(QuestionId::new(7), &record);
        let json = serde_json::to_string(&answer).unwrap();
        assert_eq!(
            json,
            r#"{"questionId":7,"selectedOptionId":2,"isCorrect":false,"points":0}"#
        );
    }

    #[test]
    fn percent_handles_empty_quiz() {
        assert_eq!(Score::new(0, 0).percent(), 0);
        assert_eq!(Score::new(10, 15).percent(), 66);
    }
}
