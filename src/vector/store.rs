//! VectorStore trait — abstract interface for namespace-scoped vector storage.
//!
//! Each indexed document owns one namespace. The primary implementation is
//! `SqliteVectorStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A stored document chunk with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier, derived from the chunk's position and text.
    pub chunk_id: String,
    /// Namespace that owns this chunk.
    pub namespace: String,
    /// 1-based page the text was extracted from.
    pub page: i64,
    /// Position of the chunk within its document.
    pub seq: i64,
    /// Character offset of the text within its page.
    pub start_offset: i64,
    /// The text content of the chunk.
    pub content: String,
}

/// A chunk returned by search, paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity; higher is more similar.
    pub score: f32,
}

/// Abstract trait for vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether any chunks exist under the namespace.
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, VectorStoreError>;

    /// Insert chunks with their embedding vectors in a single transaction.
    async fn insert_chunks(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), VectorStoreError>;

    /// Search a namespace for chunks similar to the query embedding.
    async fn search(
        &self,
        namespace: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, VectorStoreError>;

    /// Delete all chunks under a namespace.
    async fn delete_namespace(&self, namespace: &str) -> Result<usize, VectorStoreError>;

    /// Total chunk count (optionally filtered by namespace).
    async fn count(&self, namespace: Option<&str>) -> Result<usize, VectorStoreError>;
}
