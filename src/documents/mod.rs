pub mod blobs;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub use blobs::{BlobStore, FsBlobStore};

/// Metadata for one uploaded document. The raw bytes live in a
/// [`BlobStore`], keyed by (owner, id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to documents db: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                size INTEGER NOT NULL DEFAULT 0,
                content_type TEXT NOT NULL DEFAULT 'application/octet-stream',
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init documents table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id)")
            .execute(&pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn insert(&self, record: &DocumentRecord) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO documents (id, owner_id, name, size, content_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.name)
        .bind(record.size)
        .bind(&record.content_type)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn get(
        &self,
        owner_id: &str,
        document_id: &str,
    ) -> Result<Option<DocumentRecord>, ApiError> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, size, content_type, created_at
             FROM documents
             WHERE id = ? AND owner_id = ?",
        )
        .bind(document_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(row_to_record))
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<DocumentRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, size, content_type, created_at
             FROM documents
             WHERE owner_id = ?
             ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    pub async fn delete(&self, owner_id: &str, document_id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND owner_id = ?")
            .bind(document_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> DocumentRecord {
    DocumentRecord {
        id: row.try_get::<String, _>("id").unwrap_or_default(),
        owner_id: row.try_get::<String, _>("owner_id").unwrap_or_default(),
        name: row.try_get::<String, _>("name").unwrap_or_default(),
        size: row.try_get::<i64, _>("size").unwrap_or_default(),
        content_type: row.try_get::<String, _>("content_type").unwrap_or_default(),
        created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> DocumentStore {
        let tmp = std::env::temp_dir().join(format!(
            "docchat-documents-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        DocumentStore::with_path(tmp).await.unwrap()
    }

    fn make_record(id: &str, owner: &str, name: &str, created_at: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: name.to_string(),
            size: 42,
            content_type: "application/pdf".to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_get_and_delete() {
        let store = test_store().await;

        let record = make_record("doc1", "u1", "report.pdf", "2025-01-01T00:00:00Z");
        store.insert(&record).await.unwrap();

        let loaded = store.get("u1", "doc1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "report.pdf");
        assert_eq!(loaded.size, 42);
        assert_eq!(loaded.content_type, "application/pdf");

        assert!(store.delete("u1", "doc1").await.unwrap());
        assert!(store.get("u1", "doc1").await.unwrap().is_none());
        assert!(!store.delete("u1", "doc1").await.unwrap());
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_newest_first() {
        let store = test_store().await;

        store
            .insert(&make_record("d1", "u1", "old.pdf", "2025-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .insert(&make_record("d2", "u1", "new.pdf", "2025-02-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .insert(&make_record("d3", "u2", "other.pdf", "2025-03-01T00:00:00Z"))
            .await
            .unwrap();

        let docs = store.list("u1").await.unwrap();
        let names: Vec<String> = docs.into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["new.pdf", "old.pdf"]);
    }

    #[tokio::test]
    async fn get_does_not_cross_owners() {
        let store = test_store().await;

        store
            .insert(&make_record("d1", "u1", "mine.pdf", "2025-01-01T00:00:00Z"))
            .await
            .unwrap();

        assert!(store.get("u2", "d1").await.unwrap().is_none());
    }
}
