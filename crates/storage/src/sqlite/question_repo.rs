use quiz_core::model::{Question, QuestionId, QuizId, ValidatedQuestion};

use super::mapping::{id_to_i64, map_question_row, options_to_json, question_id_from_i64};
use super::{SqliteRepository, db_err};
use crate::repository::{QuestionRepository, StorageError};

const SELECT_QUESTION: &str = r"
    SELECT id, quiz_id, text, kind, options, reference_answer, points, explanation
    FROM questions
";

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO questions (quiz_id, text, kind, options, reference_answer, points, explanation)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE EXISTS (SELECT 1 FROM quizzes WHERE id = ?1)
            ",
        )
        .bind(id_to_i64("quiz_id", question.quiz_id.value())?)
        .bind(&question.text)
        .bind(question.kind.as_str())
        .bind(options_to_json(&question.options)?)
        .bind(question.reference_answer.as_deref())
        .bind(i64::from(question.points))
        .bind(question.explanation.as_deref())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        let id = question_id_from_i64(res.last_insert_rowid())?;
        Ok(question.assign_id(id))
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE questions SET
                text = ?1,
                kind = ?2,
                options = ?3,
                reference_answer = ?4,
                points = ?5,
                explanation = ?6
            WHERE id = ?7
            ",
        )
        .bind(question.text())
        .bind(question.kind().as_str())
        .bind(options_to_json(question.options())?)
        .bind(question.reference_answer())
        .bind(i64::from(question.points()))
        .bind(question.explanation())
        .bind(id_to_i64("question_id", question.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_to_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_QUESTION} WHERE id = ?1"))
            .bind(id_to_i64("question_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_QUESTION} WHERE quiz_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_to_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_question_row).collect()
    }
}
