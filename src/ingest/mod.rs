//! Document ingestion: fetches stored bytes, extracts page text, and
//! splits it into size-bounded chunks for embedding.

pub mod splitter;

use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::documents::{BlobStore, DocumentStore};

pub use splitter::TextSplitter;

/// Text extracted from one page of a source document.
#[derive(Debug, Clone)]
pub struct PageText {
    pub page: i64,
    pub text: String,
}

/// One chunk of document text ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub page: i64,
    pub start_offset: i64,
    pub seq: i64,
}

/// Extracts per-page text from raw document bytes based on the stored
/// content type. Plain text arrives as a single page.
pub fn extract_pages(bytes: &[u8], content_type: &str) -> Result<Vec<PageText>, PipelineError> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let pages: Vec<PageText> = if media_type == "application/pdf" {
        let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(PipelineError::extraction)?;
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page: i as i64 + 1,
                text,
            })
            .collect()
    } else if media_type.starts_with("text/") {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| PipelineError::extraction("text document is not valid UTF-8"))?;
        vec![PageText { page: 1, text }]
    } else {
        return Err(PipelineError::extraction(format!(
            "unsupported content type: {media_type}"
        )));
    };

    if pages.iter().all(|p| p.text.trim().is_empty()) {
        return Err(PipelineError::extraction(
            "document contains no extractable text",
        ));
    }

    Ok(pages)
}

/// Turns a stored document into embedding-ready chunks.
#[derive(Clone)]
pub struct DocumentIngestor {
    documents: DocumentStore,
    blobs: Arc<dyn BlobStore>,
    splitter: TextSplitter,
}

impl DocumentIngestor {
    pub fn new(
        documents: DocumentStore,
        blobs: Arc<dyn BlobStore>,
        splitter: TextSplitter,
    ) -> Self {
        Self {
            documents,
            blobs,
            splitter,
        }
    }

    pub async fn ingest(
        &self,
        owner_id: &str,
        document_id: &str,
    ) -> Result<Vec<TextChunk>, PipelineError> {
        let record = self
            .documents
            .get(owner_id, document_id)
            .await
            .map_err(PipelineError::document)?
            .ok_or_else(|| PipelineError::document(format!("document {document_id} not found")))?;

        let bytes = self
            .blobs
            .fetch(owner_id, document_id)
            .await
            .map_err(PipelineError::document)?;

        let pages = extract_pages(&bytes, &record.content_type)?;

        let mut chunks = Vec::new();
        let mut seq: i64 = 0;
        for page in &pages {
            for piece in self.splitter.split(&page.text) {
                chunks.push(TextChunk {
                    text: piece.text,
                    page: page.page,
                    start_offset: piece.start_offset as i64,
                    seq,
                });
                seq += 1;
            }
        }

        tracing::debug!(
            "Extracted {} chunks from document {} ({} pages)",
            chunks.len(),
            document_id,
            pages.len()
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentRecord, FsBlobStore};

    #[test]
    fn plain_text_extracts_as_a_single_page() {
        let pages = extract_pages(b"hello world", "text/plain; charset=utf-8").unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[0].text, "hello world");
    }

    #[test]
    fn garbage_pdf_bytes_fail_extraction() {
        let err = extract_pages(b"definitely not a pdf", "application/pdf").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    #[test]
    fn unsupported_content_type_is_rejected() {
        let err = extract_pages(b"\x89PNG", "image/png").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        let err = extract_pages(&[0xff, 0xfe, 0x01], "text/plain").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    #[test]
    fn whitespace_only_document_is_rejected() {
        let err = extract_pages(b"   \n\n  ", "text/plain").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailed(_)));
    }

    async fn test_ingestor() -> (DocumentIngestor, DocumentStore, tempfile::TempDir) {
        let tmp = std::env::temp_dir().join(format!(
            "docchat-ingest-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let documents = DocumentStore::with_path(tmp).await.unwrap();
        let blob_dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(FsBlobStore::new(blob_dir.path().to_path_buf()));
        let ingestor = DocumentIngestor::new(documents.clone(), blobs, TextSplitter::new(50, 10));
        (ingestor, documents, blob_dir)
    }

    #[tokio::test]
    async fn missing_document_is_unavailable() {
        let (ingestor, _documents, _dir) = test_ingestor().await;

        let err = ingestor.ingest("u1", "missing").await.unwrap_err();
        assert!(matches!(err, PipelineError::DocumentUnavailable(_)));
    }

    #[tokio::test]
    async fn metadata_without_stored_bytes_is_unavailable() {
        let (ingestor, documents, _dir) = test_ingestor().await;

        documents
            .insert(&DocumentRecord {
                id: "doc1".into(),
                owner_id: "u1".into(),
                name: "notes.txt".into(),
                size: 4,
                content_type: "text/plain".into(),
                created_at: "2025-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();

        let err = ingestor.ingest("u1", "doc1").await.unwrap_err();
        assert!(matches!(err, PipelineError::DocumentUnavailable(_)));
    }

    #[tokio::test]
    async fn stored_text_document_chunks_in_order() {
        let (ingestor, documents, _dir) = test_ingestor().await;
        let body = "The warranty period is five years. ".repeat(6);

        ingestor
            .blobs
            .put("u1", "doc1", body.as_bytes())
            .await
            .unwrap();
        documents
            .insert(&DocumentRecord {
                id: "doc1".into(),
                owner_id: "u1".into(),
                name: "warranty.txt".into(),
                size: body.len() as i64,
                content_type: "text/plain".into(),
                created_at: "2025-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap();

        let chunks = ingestor.ingest("u1", "doc1").await.unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.seq, i as i64);
            assert_eq!(chunk.page, 1);
            assert!(chunk.text.contains("warranty"));
        }
    }
}
