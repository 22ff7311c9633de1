//! Blob storage collaborator
//!
//! The workflow only ever holds keys, never bytes. Deletion is best-effort:
//! a failed cleanup is logged and never fails the accept/reject path that
//! triggered it.

use async_trait::async_trait;
use std::path::PathBuf;

use shared::util::blob_key;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Object storage for product imagery
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning the generated key
    async fn store(&self, bytes: Vec<u8>) -> Result<String, BoxError>;

    /// Delete objects by key. Per-key best-effort; the first hard error is
    /// returned after attempting every key.
    async fn delete(&self, keys: &[String]) -> Result<(), BoxError>;
}

/// Filesystem-backed store rooted at the server work directory
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: Vec<u8>) -> Result<String, BoxError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let key = blob_key();
        tokio::fs::write(self.path_of(&key), bytes).await?;
        Ok(key)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), BoxError> {
        let mut first_err: Option<BoxError> = None;
        for key in keys {
            match tokio::fs::remove_file(self.path_of(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Blob delete failed");
                    first_err.get_or_insert(e.into());
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Delete superseded blobs after a committed mutation. Failures are logged
/// only; the moderation outcome already stands.
pub async fn cleanup_best_effort(store: &dyn BlobStore, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    if let Err(e) = store.delete(keys).await {
        tracing::warn!(count = keys.len(), error = %e, "Blob cleanup incomplete");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records deleted keys for assertions; stores nothing.
    #[derive(Default)]
    pub struct RecordingStore {
        pub deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        async fn store(&self, _bytes: Vec<u8>) -> Result<String, BoxError> {
            Ok(blob_key())
        }

        async fn delete(&self, keys: &[String]) -> Result<(), BoxError> {
            self.deleted.lock().unwrap().extend_from_slice(keys);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let key = store.store(b"png bytes".to_vec()).await.unwrap();
        assert!(dir.path().join(&key).exists());

        store.delete(&[key.clone()]).await.unwrap();
        assert!(!dir.path().join(&key).exists());

        // Deleting an absent key is not an error
        store.delete(&[key]).await.unwrap();
    }
}
