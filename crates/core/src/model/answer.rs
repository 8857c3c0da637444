use crate::model::ids::OptionId;
use crate::model::question::{Question, QuestionKind};

/// What the user entered for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The identifier of the selected option.
    Choice(OptionId),
    /// Free text, verbatim.
    Text(String),
}

impl Response {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn choice(option_id: u64) -> Self {
        Self::Choice(OptionId::new(option_id))
    }
}

/// The stored response for one question and its derived correctness.
///
/// The variant is chosen by the question's kind, never by the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerRecord {
    /// `option_id` is `None` when the response named no option at all.
    Choice {
        option_id: Option<OptionId>,
        is_correct: bool,
        points: u32,
    },
    /// Descriptive answers are never auto-graded.
    Text { text: String },
}

impl AnswerRecord {
    /// Grade a response against a question.
    ///
    /// Every response yields a record. Text that is not an option id counts
    /// as a wrong choice, and a choice given to a descriptive question is
    /// kept as its id in text form.
    #[must_use]
    pub fn grade(question: &Question, response: Response) -> Self {
        match (question.kind(), response) {
            (QuestionKind::Descriptive, Response::Text(text)) => Self::Text { text },
            (QuestionKind::Descriptive, Response::Choice(id)) => Self::Text {
                text: id.to_string(),
            },
            (QuestionKind::MultipleChoice | QuestionKind::TrueFalse, response) => {
                let option_id = match response {
                    Response::Choice(id) => Some(id),
                    Response::Text(raw) => raw.parse().ok(),
                };
                let is_correct = option_id.is_some_and(|id| {
                    question
                        .correct_option()
                        .is_some_and(|correct| correct.id == id)
                });
                let points = if is_correct { question.points() } else { 0 };
                Self::Choice {
                    option_id,
                    is_correct,
                    points,
                }
            }
        }
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        match self {
            AnswerRecord::Choice { is_correct, .. } => *is_correct,
            AnswerRecord::Text { .. } => false,
        }
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        match self {
            AnswerRecord::Choice { points, .. } => *points,
            AnswerRecord::Text { .. } => 0,
        }
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<OptionId> {
        match self {
            AnswerRecord::Choice { option_id, .. } => *option_id,
            AnswerRecord::Text { .. } => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            AnswerRecord::Choice { .. } => None,
            AnswerRecord::Text { text } => Some(text),
        }
    }
}
