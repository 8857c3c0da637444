use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::CategoryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,

    #[error("category icon cannot be empty")]
    EmptyIcon,
}

/// Author input for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub icon: String,
}

impl CategoryDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `CategoryError` if the name or icon is blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedCategory, CategoryError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        let icon = self.icon.trim();
        if icon.is_empty() {
            return Err(CategoryError::EmptyIcon);
        }
        Ok(ValidatedCategory {
            name: name.to_string(),
            icon: icon.to_string(),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCategory {
    pub name: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl ValidatedCategory {
    #[must_use]
    pub fn assign_id(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            icon: self.icon,
            quiz_count: 0,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
    pub quiz_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Replace name and icon, keeping id, counters and creation time.
    #[must_use]
    pub fn with_details(self, details: ValidatedCategory) -> Self {
        Self {
            name: details.name,
            icon: details.icon,
            ..self
        }
    }
}
