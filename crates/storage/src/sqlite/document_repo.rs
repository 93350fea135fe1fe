use quiz_core::model::{Document, DocumentId};

use super::SqliteRepository;
use super::mapping::{conn, map_document_row};
use crate::repository::{DocumentRepository, StorageError};

#[async_trait::async_trait]
impl DocumentRepository for SqliteRepository {
    async fn insert_document(&self, document: &Document) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO documents (id, user_id, title, content, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(document.id.to_string())
        .bind(document.user_id.to_string())
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, title, content, created_at
                FROM documents
                WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_document_row(&row)
    }
}
