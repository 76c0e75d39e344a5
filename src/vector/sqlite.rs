//! SQLite-backed vector store implementation.
//!
//! In-process store using SQLite for chunk rows and brute-force
//! cosine similarity for search.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, StoredChunk, VectorStore, VectorStoreError};
use crate::core::config::AppPaths;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, VectorStoreError> {
        let db_path = paths.user_data_dir.join("vectors.db");
        Self::with_path(db_path).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, VectorStoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), VectorStoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                namespace TEXT NOT NULL,
                page INTEGER NOT NULL DEFAULT 1,
                seq INTEGER NOT NULL DEFAULT 0,
                start_offset INTEGER NOT NULL DEFAULT 0,
                content TEXT NOT NULL,
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_namespace ON chunks(namespace)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Embeddings are stored as little-endian f32 blobs.
    fn encode_embedding(values: &[f32]) -> Vec<u8> {
        let mut blob = Vec::with_capacity(values.len() * 4);
        for value in values {
            blob.extend_from_slice(&value.to_le_bytes());
        }
        blob
    }

    fn decode_embedding(blob: &[u8]) -> Vec<f32> {
        let mut values = Vec::with_capacity(blob.len() / 4);
        for quad in blob.chunks_exact(4) {
            values.push(f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]));
        }
        values
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        let denom = (norm_a * norm_b).sqrt();
        if denom <= f32::EPSILON {
            return 0.0;
        }
        dot / denom
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            namespace: row.get("namespace"),
            page: row.get("page"),
            seq: row.get("seq"),
            start_offset: row.get("start_offset"),
            content: row.get("content"),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, VectorStoreError> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chunks WHERE namespace = ?1)")
                .bind(namespace)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists != 0)
    }

    async fn insert_chunks(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), VectorStoreError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (chunk, embedding) in &items {
            let blob = Self::encode_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO chunks (chunk_id, namespace, page, seq, start_offset, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.namespace)
            .bind(chunk.page)
            .bind(chunk.seq)
            .bind(chunk.start_offset)
            .bind(&chunk.content)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, VectorStoreError> {
        let rows = sqlx::query(
            "SELECT chunk_id, namespace, page, seq, start_offset, content, embedding
             FROM chunks
             WHERE namespace = ?1",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            if blob.is_empty() {
                continue;
            }
            let candidate = Self::decode_embedding(&blob);
            scored.push(ChunkSearchResult {
                chunk: Self::row_to_chunk(row),
                score: Self::cosine_similarity(query_embedding, &candidate),
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<usize, VectorStoreError> {
        let result = sqlx::query("DELETE FROM chunks WHERE namespace = ?1")
            .bind(namespace)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn count(&self, namespace: Option<&str>) -> Result<usize, VectorStoreError> {
        let count: i64 = if let Some(namespace) = namespace {
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE namespace = ?1")
                .bind(namespace)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
                .fetch_one(&self.pool)
                .await?
        };

        Ok(count as usize)
    }
}
