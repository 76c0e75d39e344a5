use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::store::{ChunkSearchResult, StoredChunk, VectorStore};
use crate::core::errors::PipelineError;
use crate::ingest::{DocumentIngestor, TextChunk};
use crate::llm::LlmProvider;

const EMBED_BATCH: usize = 64;

/// Chunk ids are derived from position and text so that rebuilding the
/// same document writes the same rows. Two racing builds converge on an
/// identical namespace instead of duplicating chunks.
fn chunk_id(namespace: &str, chunk: &TextChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk.page.to_le_bytes());
    hasher.update(chunk.seq.to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds per-document vector namespaces on first use and hands out
/// search handles over them.
#[derive(Clone)]
pub struct IndexManager {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    ingestor: DocumentIngestor,
}

impl IndexManager {
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmProvider>,
        ingestor: DocumentIngestor,
    ) -> Self {
        Self {
            store,
            llm,
            ingestor,
        }
    }

    /// Returns a search handle for the document's namespace, building it
    /// first if no chunks exist under it yet. A failed build stores
    /// nothing, so the next call attempts the build again.
    pub async fn resolve(
        &self,
        owner_id: &str,
        document_id: &str,
    ) -> Result<DocumentIndex, PipelineError> {
        let namespace = document_id.to_string();

        let exists = self
            .store
            .namespace_exists(&namespace)
            .await
            .map_err(PipelineError::index)?;
        if !exists {
            self.build(owner_id, document_id, &namespace).await?;
        }

        Ok(DocumentIndex {
            namespace,
            store: Arc::clone(&self.store),
            llm: Arc::clone(&self.llm),
        })
    }

    async fn build(
        &self,
        owner_id: &str,
        document_id: &str,
        namespace: &str,
    ) -> Result<(), PipelineError> {
        let chunks = self.ingestor.ingest(owner_id, document_id).await?;

        let mut items = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let inputs: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self
                .llm
                .embed(&inputs)
                .await
                .map_err(PipelineError::index)?;
            if embeddings.len() != batch.len() {
                return Err(PipelineError::index(format!(
                    "embedding count mismatch: {} inputs, {} vectors",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                items.push((
                    StoredChunk {
                        chunk_id: chunk_id(namespace, chunk),
                        namespace: namespace.to_string(),
                        page: chunk.page,
                        seq: chunk.seq,
                        start_offset: chunk.start_offset,
                        content: chunk.text.clone(),
                    },
                    embedding,
                ));
            }
        }

        let total = items.len();
        self.store
            .insert_chunks(items)
            .await
            .map_err(PipelineError::index)?;

        tracing::info!(
            "Indexed document {} into namespace {} ({} chunks)",
            document_id,
            namespace,
            total
        );
        Ok(())
    }
}

/// Search handle over one built document namespace.
#[derive(Clone)]
pub struct DocumentIndex {
    namespace: String,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl DocumentIndex {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Embeds the query and returns the `limit` most similar chunks.
    pub async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, PipelineError> {
        let embeddings = self
            .llm
            .embed(&[query.to_string()])
            .await
            .map_err(PipelineError::generation)?;
        let query_embedding = embeddings
            .first()
            .ok_or_else(|| PipelineError::generation("embedding response was empty"))?;

        self.store
            .search(&self.namespace, query_embedding, limit)
            .await
            .map_err(PipelineError::generation)
    }
}
