//! # Cache Store
//!
//! File-based persistent store for downloaded payloads. Each entry is a blob
//! file named by its [`CacheKey`] plus a `<key>.meta` sidecar. Writes go
//! through a temp-file-then-rename so readers observe either the previous
//! complete content or the new one, never a partial write.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::fs;
use tokio::io;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::meta::EntryMetadata;

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    initialized: Arc<AtomicBool>,
}

impl CacheStore {
    /// Create a store rooted at the given directory. The directory itself is
    /// created lazily on first use.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Create the cache root if it does not exist yet. The flag is published
    /// only once the directory exists, so a failed attempt is retried by the
    /// next caller instead of latching a broken store.
    async fn ensure_initialized(&self) -> io::Result<()> {
        // Fast path - already initialized
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        // create_dir_all is idempotent, concurrent callers are harmless
        fs::create_dir_all(&self.root).await?;
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn blob_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn meta_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.meta"))
    }

    /// Whether a complete entry (blob and sidecar) exists for the key.
    pub async fn exists(&self, key: &CacheKey) -> io::Result<bool> {
        self.ensure_initialized().await?;

        let blob_exists = fs::try_exists(self.blob_path(key)).await?;
        let meta_exists = fs::try_exists(self.meta_path(key)).await?;

        Ok(blob_exists && meta_exists)
    }

    /// Read the blob for a key. Fails with `NotFound` if the entry is absent.
    pub async fn read(&self, key: &CacheKey) -> io::Result<Bytes> {
        self.ensure_initialized().await?;

        let data = fs::read(self.blob_path(key)).await?;
        Ok(Bytes::from(data))
    }

    /// Read the sidecar metadata for a key, or `None` if it is absent. A
    /// sidecar that no longer parses is treated as absent and removed along
    /// with its blob.
    pub async fn read_metadata(&self, key: &CacheKey) -> io::Result<Option<EntryMetadata>> {
        self.ensure_initialized().await?;

        let meta_path = self.meta_path(key);
        let bytes = match fs::read(&meta_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&bytes) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                warn!(path = ?meta_path, error = %e, "failed to parse cache metadata, dropping entry");
                let _ = fs::remove_file(&meta_path).await;
                let _ = fs::remove_file(self.blob_path(key)).await;
                Ok(None)
            }
        }
    }

    /// Persist a blob for a key, replacing any previous content and stamping
    /// fresh metadata. Both files are published via rename.
    pub async fn write(&self, key: &CacheKey, data: &[u8]) -> io::Result<EntryMetadata> {
        self.ensure_initialized().await?;

        let blob_path = self.blob_path(key);
        let meta_path = self.meta_path(key);

        let metadata = EntryMetadata::new(data.len() as u64);
        let metadata_json = serde_json::to_vec(&metadata).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize metadata: {e}"),
            )
        })?;

        let temp_blob_path = blob_path.with_extension("tmp");
        let temp_meta_path = meta_path.with_extension("meta.tmp");

        if let Err(e) = fs::write(&temp_blob_path, data).await {
            warn!(path = ?temp_blob_path, error = %e, "failed to write cache blob file");
            return Err(e);
        }

        if let Err(e) = fs::write(&temp_meta_path, &metadata_json).await {
            warn!(path = ?temp_meta_path, error = %e, "failed to write cache metadata file");
            let _ = fs::remove_file(&temp_blob_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_blob_path, &blob_path).await {
            warn!(from = ?temp_blob_path, to = ?blob_path, error = %e, "failed to publish cache blob");
            let _ = fs::remove_file(&temp_blob_path).await;
            let _ = fs::remove_file(&temp_meta_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_meta_path, &meta_path).await {
            warn!(from = ?temp_meta_path, to = ?meta_path, error = %e, "failed to publish cache metadata");
            // Blob landed without its sidecar, remove it to stay consistent
            let _ = fs::remove_file(&blob_path).await;
            let _ = fs::remove_file(&temp_meta_path).await;
            return Err(e);
        }

        debug!(key = %key, size = metadata.size, "cached entry to disk");
        Ok(metadata)
    }

    /// Remove the entry for a key. Removing an absent entry succeeds.
    pub async fn delete(&self, key: &CacheKey) -> io::Result<()> {
        self.ensure_initialized().await?;

        let blob_result = fs::remove_file(self.blob_path(key)).await;
        let meta_result = fs::remove_file(self.meta_path(key)).await;

        match (blob_result, meta_result) {
            (Err(e), _) if e.kind() != io::ErrorKind::NotFound => {
                warn!(key = %key, error = %e, "failed to remove cache blob file");
                Err(e)
            }
            (_, Err(e)) if e.kind() != io::ErrorKind::NotFound => {
                warn!(key = %key, error = %e, "failed to remove cache metadata file");
                Err(e)
            }
            _ => Ok(()),
        }
    }

    /// Remove every persisted entry and its metadata. The root is recreated
    /// lazily by the next write.
    pub async fn clear_all(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(dir = ?self.root, error = %e, "failed to clear cache directory");
                return Err(e);
            }
        }

        self.initialized.store(false, Ordering::Relaxed);
        debug!(dir = ?self.root, "cleared all cache entries");
        Ok(())
    }
}
