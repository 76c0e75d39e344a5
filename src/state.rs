use std::sync::Arc;

use thiserror::Error;

use crate::chat::ChatPipeline;
use crate::core::config::{AppPaths, Settings};
use crate::documents::{BlobStore, DocumentStore, FsBlobStore};
use crate::history::HistoryStore;
use crate::ingest::{DocumentIngestor, TextSplitter};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::vector::{IndexManager, SqliteVectorStore, VectorStore};

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize history store: {0}")]
    History(#[source] anyhow::Error),

    #[error("Failed to initialize document store: {0}")]
    Documents(#[source] anyhow::Error),

    #[error("Failed to initialize vector store: {0}")]
    Vector(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),
}

/// Global application state shared across all routes.
///
/// Contains references to:
/// - Configuration and paths
/// - Database connections (history, documents, vectors)
/// - Blob storage for raw document bytes
/// - The LLM provider and the chat pipeline wired on top of them
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub history: HistoryStore,
    pub documents: DocumentStore,
    pub blobs: Arc<dyn BlobStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub vector: Arc<dyn VectorStore>,
    pub index: IndexManager,
    pub pipeline: ChatPipeline,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Setting up paths and loading configuration
    /// 2. Initializing databases (history, documents, vectors)
    /// 3. Setting up the LLM provider
    /// 4. Wiring the ingestor, index manager, and chat pipeline
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Arc::new(Settings::load(&paths).map_err(InitializationError::Config)?);

        let history = HistoryStore::new(paths.db_path.clone())
            .await
            .map_err(|e| InitializationError::History(e.into()))?;

        let documents = DocumentStore::new(paths.as_ref())
            .await
            .map_err(|e| InitializationError::Documents(e.into()))?;

        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(paths.documents_dir.clone()));

        let vector: Arc<dyn VectorStore> = Arc::new(
            SqliteVectorStore::new(paths.as_ref())
                .await
                .map_err(|e| InitializationError::Vector(e.into()))?,
        );

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OpenAiProvider::new(&settings.llm).map_err(InitializationError::Llm)?);

        let splitter = TextSplitter::new(
            settings.indexing.chunk_size,
            settings.indexing.chunk_overlap,
        );
        let ingestor = DocumentIngestor::new(documents.clone(), blobs.clone(), splitter);
        let index = IndexManager::new(vector.clone(), llm.clone(), ingestor);
        let pipeline = ChatPipeline::new(
            history.clone(),
            index.clone(),
            llm.clone(),
            settings.chat.history_window,
            settings.chat.top_k,
        );

        Ok(Arc::new(AppState {
            paths,
            settings,
            history,
            documents,
            blobs,
            llm,
            vector,
            index,
            pipeline,
        }))
    }
}
