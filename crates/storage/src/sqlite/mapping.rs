use std::str::FromStr;

use quiz_core::model::{
    AttemptId, AttemptRecord, Difficulty, Document, IncorrectAnswer, Question, Quiz, Subject,
    SubjectColor, SubjectIcon,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn parse_id<T: FromStr>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    raw.parse::<T>()
        .map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

fn parse_opt_id<T: FromStr>(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, StorageError> {
    raw.map(|s| parse_id(field, &s)).transpose()
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Ok(Quiz {
        id: parse_id("quiz id", &id)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        subject_id: parse_opt_id("subject_id", row.try_get("subject_id").map_err(ser)?)?,
        user_id: parse_id("user_id", &user_id)?,
        document_id: parse_opt_id("document_id", row.try_get("document_id").map_err(ser)?)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        difficulty: Difficulty::from_level(row.try_get::<i64, _>("difficulty_level").map_err(ser)?),
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let options: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options).map_err(ser)?;

    Question::from_persisted(
        parse_id("question id", &id)?,
        parse_id("quiz_id", &quiz_id)?,
        row.try_get("question").map_err(ser)?,
        row.try_get("correct_answer").map_err(ser)?,
        options,
        row.try_get("explanation").map_err(ser)?,
        row.try_get("latex_content").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<AttemptRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let incorrect: String = row.try_get("incorrect_answers").map_err(ser)?;
    let incorrect: Vec<IncorrectAnswer> = serde_json::from_str(&incorrect).map_err(ser)?;

    AttemptRecord::from_persisted(
        parse_id::<AttemptId>("attempt id", &id)?,
        parse_id("quiz_id", &quiz_id)?,
        parse_id("user_id", &user_id)?,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64("time_spent", row.try_get::<i64, _>("time_spent").map_err(ser)?)?,
        row.try_get("completed_at").map_err(ser)?,
        incorrect,
    )
    .map_err(ser)
}

pub(crate) fn map_subject_row(row: &SqliteRow) -> Result<Subject, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let icon: String = row.try_get("icon").map_err(ser)?;
    let color: String = row.try_get("color").map_err(ser)?;
    Ok(Subject {
        id: parse_id("subject id", &id)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        icon: SubjectIcon::from_tag(&icon),
        color: SubjectColor::from_tag(&color),
        user_id: Some(parse_id("user_id", &user_id)?),
    })
}

pub(crate) fn map_document_row(row: &SqliteRow) -> Result<Document, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Document::new(
        parse_id("document id", &id)?,
        parse_id("user_id", &user_id)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("content").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizId;

    #[test]
    fn parse_id_reports_field() {
        let err = parse_id::<QuizId>("quiz id", "nope").unwrap_err();
        assert_eq!(err.to_string(), "serialization error: invalid quiz id: nope");
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(u32_from_i64("score", -1).is_err());
        assert_eq!(u32_from_i64("score", 7).unwrap(), 7);
    }
}
