use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::{CategoryId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("invalid thumbnail url: {0}")]
    InvalidThumbnail(String),

    #[error("unknown quiz status: {0}")]
    UnknownStatus(String),

    #[error("rating must be between 0 and 5")]
    InvalidRating,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizStatus {
    #[default]
    Draft,
    Published,
}

impl QuizStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::Draft => "Draft",
            QuizStatus::Published => "Published",
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizStatus {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(QuizStatus::Draft),
            "Published" => Ok(QuizStatus::Published),
            other => Err(QuizError::UnknownStatus(other.to_string())),
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Author input for a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub difficulty: String,
    pub time_estimate: String,
    pub thumbnail_url: Option<String>,
    pub status: QuizStatus,
}

impl QuizDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category_id,
            difficulty: "Beginner".to_string(),
            time_estimate: String::new(),
            thumbnail_url: None,
            status: QuizStatus::Draft,
        }
    }

    #[must_use]
    pub fn published(mut self) -> Self {
        self.status = QuizStatus::Published;
        self
    }

    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` for a blank title and
    /// `QuizError::InvalidThumbnail` if the thumbnail is not an absolute URL.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuiz, QuizError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }

        let thumbnail_url = match self.thumbnail_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Url::parse(raw).map_err(|e| QuizError::InvalidThumbnail(format!("{raw}: {e}")))?,
            ),
        };

        Ok(ValidatedQuiz {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            category_id: self.category_id,
            difficulty: self.difficulty.trim().to_string(),
            time_estimate: self.time_estimate.trim().to_string(),
            thumbnail_url,
            status: self.status,
            last_updated: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuiz {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub difficulty: String,
    pub time_estimate: String,
    pub thumbnail_url: Option<Url>,
    pub status: QuizStatus,
    pub last_updated: DateTime<Utc>,
}

impl ValidatedQuiz {
    /// Fresh quizzes start without questions, attempts or rating.
    #[must_use]
    pub fn assign_id(self, id: QuizId) -> Quiz {
        Quiz {
            id,
            title: self.title,
            description: self.description,
            category_id: self.category_id,
            difficulty: self.difficulty,
            time_estimate: self.time_estimate,
            thumbnail_url: self.thumbnail_url,
            status: self.status,
            questions_count: 0,
            attempts: 0,
            rating: 0.0,
            last_updated: self.last_updated,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub difficulty: String,
    pub time_estimate: String,
    pub thumbnail_url: Option<Url>,
    pub status: QuizStatus,
    pub questions_count: u32,
    pub attempts: u32,
    pub rating: f32,
    pub last_updated: DateTime<Utc>,
}

impl Quiz {
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == QuizStatus::Published
    }

    /// Apply edited details, keeping id and counters.
    #[must_use]
    pub fn with_details(self, details: ValidatedQuiz) -> Self {
        Self {
            title: details.title,
            description: details.description,
            category_id: details.category_id,
            difficulty: details.difficulty,
            time_estimate: details.time_estimate,
            thumbnail_url: details.thumbnail_url,
            status: details.status,
            last_updated: details.last_updated,
            ..self
        }
    }

    /// Draft for a copy of this quiz; copies always start unpublished.
    #[must_use]
    pub fn duplicate_draft(&self) -> QuizDraft {
        QuizDraft {
            title: format!("{} (Copy)", self.title),
            description: self.description.clone(),
            category_id: self.category_id,
            difficulty: self.difficulty.clone(),
            time_estimate: self.time_estimate.clone(),
            thumbnail_url: self.thumbnail_url.as_ref().map(Url::to_string),
            status: QuizStatus::Draft,
        }
    }
}

/// Checks a persisted rating.
///
/// # Errors
///
/// Returns `QuizError::InvalidRating` outside `0.0..=5.0`.
pub fn check_rating(rating: f32) -> Result<f32, QuizError> {
    if (0.0..=5.0).contains(&rating) {
        Ok(rating)
    } else {
        Err(QuizError::InvalidRating)
    }
}
