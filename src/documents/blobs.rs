use std::path::PathBuf;

use anyhow::{bail, Context};
use async_trait::async_trait;

/// Byte source for uploaded documents. Implementations resolve
/// (owner, document) keys to raw bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// store raw document bytes
    async fn put(&self, owner_id: &str, document_id: &str, bytes: &[u8]) -> anyhow::Result<()>;

    /// fetch raw document bytes
    async fn fetch(&self, owner_id: &str, document_id: &str) -> anyhow::Result<Vec<u8>>;

    /// remove stored bytes; Ok(false) when nothing was stored
    async fn remove(&self, owner_id: &str, document_id: &str) -> anyhow::Result<bool>;
}

/// Filesystem implementation storing bytes under `<root>/<owner>/<document>`.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_path(&self, owner_id: &str, document_id: &str) -> anyhow::Result<PathBuf> {
        Ok(self
            .root
            .join(safe_component(owner_id)?)
            .join(safe_component(document_id)?))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, owner_id: &str, document_id: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let path = self.blob_path(owner_id, document_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    async fn fetch(&self, owner_id: &str, document_id: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.blob_path(owner_id, document_id)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("no stored bytes for document {}", document_id))
    }

    async fn remove(&self, owner_id: &str, document_id: &str) -> anyhow::Result<bool> {
        let path = self.blob_path(owner_id, document_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Ids become path components, so anything that could escape the store
/// root is rejected.
fn safe_component(id: &str) -> anyhow::Result<&str> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
        bail!("invalid path component: {:?}", id);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_fetch_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        store.put("u1", "d1", b"hello").await.unwrap();
        let bytes = store.fetch("u1", "d1").await.unwrap();
        assert_eq!(bytes, b"hello");

        assert!(store.remove("u1", "d1").await.unwrap());
        assert!(!store.remove("u1", "d1").await.unwrap());
        assert!(store.fetch("u1", "d1").await.is_err());
    }

    #[tokio::test]
    async fn rejects_path_traversal_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().to_path_buf());

        assert!(store.put("../u1", "d1", b"x").await.is_err());
        assert!(store.fetch("u1", "../../etc/passwd").await.is_err());
        assert!(store.put("", "d1", b"x").await.is_err());
    }
}
