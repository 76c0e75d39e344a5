pub mod index;
pub mod sqlite;
pub mod store;

pub use index::{DocumentIndex, IndexManager};
pub use sqlite::SqliteVectorStore;
pub use store::{ChunkSearchResult, StoredChunk, VectorStore, VectorStoreError};
