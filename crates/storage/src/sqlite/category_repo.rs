use quiz_core::model::{Category, CategoryId, ValidatedCategory};

use super::mapping::{category_id_from_i64, id_to_i64, map_category_row};
use super::{SqliteRepository, db_err};
use crate::repository::{CategoryRepository, StorageError};

const SELECT_CATEGORY: &str = r"
    SELECT c.id, c.name, c.icon, c.created_at,
           (SELECT COUNT(*) FROM quizzes q WHERE q.category_id = c.id) AS quiz_count
    FROM categories c
";

#[async_trait::async_trait]
impl CategoryRepository for SqliteRepository {
    async fn insert_category(&self, category: ValidatedCategory) -> Result<Category, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO categories (name, icon, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(&category.name)
        .bind(&category.icon)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = category_id_from_i64(res.last_insert_rowid())?;
        Ok(category.assign_id(id))
    }

    async fn update_category(&self, category: &Category) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE categories SET name = ?1, icon = ?2 WHERE id = ?3")
            .bind(&category.name)
            .bind(&category.icon)
            .bind(id_to_i64("category_id", category.id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id_to_i64("category_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_CATEGORY} WHERE c.id = ?1"))
            .bind(id_to_i64("category_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_category_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query(&format!("{SELECT_CATEGORY} ORDER BY c.id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_category_row).collect()
    }
}
