use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, QuizId};

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    Descriptive,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::TrueFalse => "true-false",
            QuestionKind::Descriptive => "descriptive",
        }
    }

    /// Choice kinds are answered by picking one predefined option.
    #[must_use]
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::TrueFalse)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(QuestionKind::MultipleChoice),
            "true-false" => Ok(QuestionKind::TrueFalse),
            "descriptive" => Ok(QuestionKind::Descriptive),
            other => Err(QuestionError::UnknownKind(other.to_string())),
        }
    }
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// A selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: u64, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: OptionId::new(id),
            text: text.into(),
            is_correct,
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question points must be > 0")]
    ZeroPoints,

    #[error("unknown question kind: {0}")]
    UnknownKind(String),

    #[error("{kind} questions need at least two options, found {count}")]
    TooFewOptions { kind: QuestionKind, count: usize },

    #[error("true-false questions need exactly two options, found {count}")]
    TrueFalseOptionCount { count: usize },

    #[error("option {0} has no text")]
    EmptyOptionText(OptionId),

    #[error("option id {0} is used more than once")]
    DuplicateOption(OptionId),

    #[error("choice questions need exactly one correct option, found {count}")]
    CorrectOptionCount { count: usize },

    #[error("descriptive questions cannot have options")]
    DescriptiveWithOptions,

    #[error("descriptive questions need a reference answer")]
    MissingReferenceAnswer,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Author input for a question, not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub quiz_id: QuizId,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
    pub reference_answer: Option<String>,
    pub points: u32,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// A true/false question with the standard `True` (1) / `False` (2) options.
    #[must_use]
    pub fn true_false(quiz_id: QuizId, text: impl Into<String>, answer: bool, points: u32) -> Self {
        Self {
            quiz_id,
            text: text.into(),
            kind: QuestionKind::TrueFalse,
            options: vec![
                AnswerOption::new(1, "True", answer),
                AnswerOption::new(2, "False", !answer),
            ],
            reference_answer: None,
            points,
            explanation: None,
        }
    }

    #[must_use]
    pub fn multiple_choice(
        quiz_id: QuizId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        points: u32,
    ) -> Self {
        Self {
            quiz_id,
            text: text.into(),
            kind: QuestionKind::MultipleChoice,
            options,
            reference_answer: None,
            points,
            explanation: None,
        }
    }

    #[must_use]
    pub fn descriptive(
        quiz_id: QuizId,
        text: impl Into<String>,
        reference_answer: impl Into<String>,
        points: u32,
    ) -> Self {
        Self {
            quiz_id,
            text: text.into(),
            kind: QuestionKind::Descriptive,
            options: Vec::new(),
            reference_answer: Some(reference_answer.into()),
            points,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Apply authoring rules.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, points are zero, the
    /// option set does not match the kind, or a descriptive question lacks a
    /// reference answer.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if let Some(option) = self.options.iter().find(|o| o.text.trim().is_empty()) {
            return Err(QuestionError::EmptyOptionText(option.id));
        }
        if self.kind == QuestionKind::Descriptive
            && self
                .reference_answer
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
        {
            return Err(QuestionError::MissingReferenceAnswer);
        }
        check_structure(self.kind, &self.options, self.points)?;

        let reference_answer = match self.kind {
            QuestionKind::Descriptive => self.reference_answer,
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse => None,
        };

        Ok(ValidatedQuestion {
            quiz_id: self.quiz_id,
            text: self.text.trim().to_string(),
            kind: self.kind,
            options: self.options,
            reference_answer,
            points: self.points,
            explanation: self.explanation.filter(|e| !e.trim().is_empty()),
        })
    }
}

fn check_structure(
    kind: QuestionKind,
    options: &[AnswerOption],
    points: u32,
) -> Result<(), QuestionError> {
    if points == 0 {
        return Err(QuestionError::ZeroPoints);
    }

    if !kind.is_choice() {
        if !options.is_empty() {
            return Err(QuestionError::DescriptiveWithOptions);
        }
        return Ok(());
    }

    if options.len() < 2 {
        return Err(QuestionError::TooFewOptions {
            kind,
            count: options.len(),
        });
    }
    if kind == QuestionKind::TrueFalse && options.len() != 2 {
        return Err(QuestionError::TrueFalseOptionCount {
            count: options.len(),
        });
    }

    let mut seen = HashSet::with_capacity(options.len());
    for option in options {
        if !seen.insert(option.id) {
            return Err(QuestionError::DuplicateOption(option.id));
        }
    }

    let correct = options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        return Err(QuestionError::CorrectOptionCount { count: correct });
    }

    Ok(())
}

/// A question that passed authoring rules but has no storage id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub quiz_id: QuizId,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
    pub reference_answer: Option<String>,
    pub points: u32,
    pub explanation: Option<String>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            quiz_id: self.quiz_id,
            text: self.text,
            kind: self.kind,
            options: self.options,
            reference_answer: self.reference_answer,
            points: self.points,
            explanation: self.explanation,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question of a quiz.
///
/// Choice kinds always carry exactly one correct option; descriptive
/// questions carry no options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    quiz_id: QuizId,
    text: String,
    kind: QuestionKind,
    options: Vec<AnswerOption>,
    reference_answer: Option<String>,
    points: u32,
    explanation: Option<String>,
}

impl Question {
    /// Rehydrate a question from storage.
    ///
    /// Only structural invariants are re-checked; authoring-only rules such
    /// as non-empty option text are not.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stored options contradict the kind.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        quiz_id: QuizId,
        text: String,
        kind: QuestionKind,
        options: Vec<AnswerOption>,
        reference_answer: Option<String>,
        points: u32,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        check_structure(kind, &options, points)?;
        Ok(Self {
            id,
            quiz_id,
            text,
            kind,
            options,
            reference_answer,
            points,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// The designated correct option of a choice question.
    #[must_use]
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    #[must_use]
    pub fn reference_answer(&self) -> Option<&str> {
        self.reference_answer.as_deref()
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Turn the question back into an editable draft for another quiz.
    #[must_use]
    pub fn to_draft(&self, quiz_id: QuizId) -> QuestionDraft {
        QuestionDraft {
            quiz_id,
            text: self.text.clone(),
            kind: self.kind,
            options: self.options.clone(),
            reference_answer: self.reference_answer.clone(),
            points: self.points,
            explanation: self.explanation.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
