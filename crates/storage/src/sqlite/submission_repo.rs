use chrono::{DateTime, Utc};
use quiz_core::model::{QuizId, Submission, SubmissionId, SubmissionSnapshot};
use sqlx::Row;

use super::mapping::{answers_to_json, id_to_i64, map_submission_row, ser, submission_id_from_i64};
use super::{SqliteRepository, db_err};
use crate::repository::{StorageError, SubmissionRepository};

const SELECT_SUBMISSION: &str = r"
    SELECT id, quiz_id, user_id, display_name, score, total_points, completed_at, answers
    FROM quiz_submissions
";

#[async_trait::async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn create_submission(
        &self,
        snapshot: &SubmissionSnapshot,
    ) -> Result<Submission, StorageError> {
        let score = snapshot.score();
        let res = sqlx::query(
            r"
            INSERT INTO quiz_submissions (quiz_id, user_id, display_name, score, total_points,
                                          completed_at, answers)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE EXISTS (SELECT 1 FROM quizzes WHERE id = ?1)
            ",
        )
        .bind(id_to_i64("quiz_id", snapshot.quiz_id().value())?)
        .bind(snapshot.user_id())
        .bind(snapshot.display_name())
        .bind(i64::from(score.earned))
        .bind(i64::from(score.total))
        .bind(snapshot.completed_at())
        .bind(answers_to_json(snapshot.answers())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        let id = submission_id_from_i64(res.last_insert_rowid())?;
        Ok(Submission::new(id, snapshot.clone()))
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_SUBMISSION} WHERE id = ?1"))
            .bind(id_to_i64("submission_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_submission_row).transpose()
    }

    async fn list_recent_submissions(&self, limit: u32) -> Result<Vec<Submission>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_SUBMISSION} ORDER BY completed_at DESC, id DESC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_submission_row).collect()
    }

    async fn list_submissions_for_quiz(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<Submission>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_SUBMISSION} WHERE quiz_id = ?1 ORDER BY completed_at DESC, id DESC LIMIT ?2"
        ))
        .bind(id_to_i64("quiz_id", quiz_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_submission_row).collect()
    }

    async fn list_submissions_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Submission>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_SUBMISSION} WHERE completed_at >= ?1 AND completed_at <= ?2 \
             ORDER BY completed_at DESC, id DESC"
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_submission_row).collect()
    }

    async fn count_submissions(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quiz_submissions")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let n: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(n).map_err(ser)
    }
}
