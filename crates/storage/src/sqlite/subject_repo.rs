use quiz_core::model::{Subject, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_subject_row};
use crate::repository::{StorageError, SubjectRepository};

#[async_trait::async_trait]
impl SubjectRepository for SqliteRepository {
    async fn insert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let Some(user_id) = subject.user_id else {
            return Err(StorageError::Serialization(
                "built-in subjects are not stored".into(),
            ));
        };

        let res = sqlx::query(
            r"
                INSERT INTO subjects (id, user_id, name, description, icon, color)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(subject.id.as_str())
        .bind(user_id.to_string())
        .bind(&subject.name)
        .bind(&subject.description)
        .bind(subject.icon.tag())
        .bind(subject.color.tag())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn list_subjects_for_user(&self, user_id: UserId) -> Result<Vec<Subject>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, name, description, icon, color
                FROM subjects
                WHERE user_id = ?1
                ORDER BY name ASC, id ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_subject_row).collect()
    }
}
