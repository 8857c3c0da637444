use quiz_core::model::{CategoryId, Quiz, QuizId, ValidatedQuiz};

use super::mapping::{id_to_i64, map_quiz_row, quiz_id_from_i64};
use super::{SqliteRepository, db_err};
use crate::repository::{QuizRepository, StorageError};

const SELECT_QUIZ: &str = r"
    SELECT id, title, description, category_id, difficulty, time_estimate, thumbnail_url,
           status, questions_count, attempts, rating, last_updated
    FROM quizzes
";

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: ValidatedQuiz) -> Result<Quiz, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quizzes (title, description, category_id, difficulty, time_estimate,
                                 thumbnail_url, status, last_updated)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE EXISTS (SELECT 1 FROM categories WHERE id = ?3)
            ",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(id_to_i64("category_id", quiz.category_id.value())?)
        .bind(&quiz.difficulty)
        .bind(&quiz.time_estimate)
        .bind(quiz.thumbnail_url.as_ref().map(url::Url::as_str))
        .bind(quiz.status.as_str())
        .bind(quiz.last_updated)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        let id = quiz_id_from_i64(res.last_insert_rowid())?;
        Ok(quiz.assign_id(id))
    }

    async fn update_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE quizzes SET
                title = ?1,
                description = ?2,
                category_id = ?3,
                difficulty = ?4,
                time_estimate = ?5,
                thumbnail_url = ?6,
                status = ?7,
                rating = ?8,
                last_updated = ?9
            WHERE id = ?10
              AND EXISTS (SELECT 1 FROM categories WHERE id = ?3)
            ",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(id_to_i64("category_id", quiz.category_id.value())?)
        .bind(&quiz.difficulty)
        .bind(&quiz.time_estimate)
        .bind(quiz.thumbnail_url.as_ref().map(url::Url::as_str))
        .bind(quiz.status.as_str())
        .bind(f64::from(quiz.rating))
        .bind(quiz.last_updated)
        .bind(id_to_i64("quiz_id", quiz.id.value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id_to_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_QUIZ} WHERE id = ?1"))
            .bind(id_to_i64("quiz_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn list_quizzes(&self, category: Option<CategoryId>) -> Result<Vec<Quiz>, StorageError> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "{SELECT_QUIZ} WHERE category_id = ?1 ORDER BY id ASC"
                ))
                .bind(id_to_i64("category_id", category.value())?)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{SELECT_QUIZ} ORDER BY id ASC"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(map_quiz_row).collect()
    }

    async fn increment_attempts(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE quizzes SET attempts = attempts + 1 WHERE id = ?1")
            .bind(id_to_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn adjust_questions_count(&self, id: QuizId, delta: i32) -> Result<(), StorageError> {
        let res = sqlx::query(
            "UPDATE quizzes SET questions_count = MAX(questions_count + ?1, 0) WHERE id = ?2",
        )
        .bind(i64::from(delta))
        .bind(id_to_i64("quiz_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
