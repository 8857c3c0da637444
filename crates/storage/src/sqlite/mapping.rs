use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerOption, Category, CategoryId, Question, QuestionId, QuestionKind, Quiz, QuizId,
    QuizStatus, Score, Submission, SubmissionId, SubmissionSnapshot, SubmittedAnswer,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use url::Url;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn submission_id_from_i64(v: i64) -> Result<SubmissionId, StorageError> {
    Ok(SubmissionId::new(i64_to_u64("submission_id", v)?))
}

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<Category, StorageError> {
    Ok(Category {
        id: category_id_from_i64(row.try_get("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        icon: row.try_get("icon").map_err(ser)?,
        quiz_count: i64_to_u32("quiz_count", row.try_get("quiz_count").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let thumbnail_url = row
        .try_get::<Option<String>, _>("thumbnail_url")
        .map_err(ser)?
        .map(|raw| Url::parse(&raw).map_err(ser))
        .transpose()?;
    let rating: f64 = row.try_get("rating").map_err(ser)?;

    #[allow(clippy::cast_possible_truncation)]
    Ok(Quiz {
        id: quiz_id_from_i64(row.try_get("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        category_id: category_id_from_i64(row.try_get("category_id").map_err(ser)?)?,
        difficulty: row.try_get("difficulty").map_err(ser)?,
        time_estimate: row.try_get("time_estimate").map_err(ser)?,
        thumbnail_url,
        status: status.parse::<QuizStatus>().map_err(ser)?,
        questions_count: i64_to_u32(
            "questions_count",
            row.try_get("questions_count").map_err(ser)?,
        )?,
        attempts: i64_to_u32("attempts", row.try_get("attempts").map_err(ser)?)?,
        rating: rating as f32,
        last_updated: row.try_get("last_updated").map_err(ser)?,
    })
}

pub(crate) fn options_to_json(options: &[AnswerOption]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    let options: String = row.try_get("options").map_err(ser)?;
    let options: Vec<AnswerOption> = serde_json::from_str(&options).map_err(ser)?;

    Question::from_persisted(
        question_id_from_i64(row.try_get("id").map_err(ser)?)?,
        quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?,
        row.try_get("text").map_err(ser)?,
        kind.parse::<QuestionKind>().map_err(ser)?,
        options,
        row.try_get("reference_answer").map_err(ser)?,
        i64_to_u32("points", row.try_get("points").map_err(ser)?)?,
        row.try_get("explanation").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn answers_to_json(answers: &[SubmittedAnswer]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn map_submission_row(row: &SqliteRow) -> Result<Submission, StorageError> {
    let answers: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<SubmittedAnswer> = serde_json::from_str(&answers).map_err(ser)?;
    let user_id: Option<Uuid> = row.try_get("user_id").map_err(ser)?;
    let display_name: String = row.try_get("display_name").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let score = Score::new(
        i64_to_u32("score", row.try_get("score").map_err(ser)?)?,
        i64_to_u32("total_points", row.try_get("total_points").map_err(ser)?)?,
    );

    let snapshot = SubmissionSnapshot::new(
        quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?,
        user_id,
        &display_name,
        score,
        completed_at,
        answers,
    )
    .map_err(ser)?;

    Ok(Submission::new(
        submission_id_from_i64(row.try_get("id").map_err(ser)?)?,
        snapshot,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(matches!(
            quiz_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(category_id_from_i64(7).unwrap(), CategoryId::new(7));
    }

    #[test]
    fn huge_ids_do_not_wrap() {
        assert!(id_to_i64("quiz_id", u64::MAX).is_err());
    }

    #[test]
    fn options_json_uses_camel_case() {
        let json = options_to_json(&[AnswerOption::new(1, "Yes", true)]).unwrap();
        assert_eq!(json, r#"[{"id":1,"text":"Yes","isCorrect":true}]"#);
    }
}
