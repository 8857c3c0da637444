use std::sync::Arc;

use quiz_core::model::{Category, CategoryDraft, CategoryId};
use storage::repository::{CategoryRepository, StorageError};

use crate::Clock;
use crate::auth::{AuthProvider, require_admin};
use crate::error::CatalogError;

/// Lists and edits quiz categories.
#[derive(Clone)]
pub struct CategoryService {
    clock: Clock,
    auth: Arc<dyn AuthProvider>,
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthProvider>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            clock,
            auth,
            categories,
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_categories().await?)
    }

    /// Create a category with no quizzes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Category` for blank fields.
    pub async fn create(&self, name: &str, icon: &str) -> Result<Category, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let draft = CategoryDraft::new(name, icon).validate(self.clock.now())?;
        let category = self.categories.insert_category(draft).await?;
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Rename a category or change its icon.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in,
    /// `CatalogError::Category` for blank fields, and
    /// `CatalogError::Storage` if the category does not exist.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        icon: &str,
    ) -> Result<Category, CatalogError> {
        require_admin(self.auth.as_ref())?;
        let existing = self
            .categories
            .get_category(id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let details = CategoryDraft::new(name, icon).validate(existing.created_at)?;
        let updated = existing.with_details(details);
        self.categories.update_category(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Auth` unless an admin is signed in, and
    /// `CatalogError::Storage` (`Conflict`) while quizzes still use it.
    pub async fn delete(&self, id: CategoryId) -> Result<(), CatalogError> {
        require_admin(self.auth.as_ref())?;
        self.categories.delete_category(id).await?;
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}
