//! Persistence adapter: the whole collection as one serialized blob.
//!
//! Storage is keyed like a key-value store. Saves overwrite the previous
//! snapshot; loads never fail from the caller's point of view and fall back to
//! an empty collection.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::types::Snapshot;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Stored bytes are not a valid snapshot
    #[error("failed to deserialize snapshot: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The backend refused the write
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`TodoStorage`] methods
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key-value persistence for the todo collection
///
/// Returns boxed futures so the trait can be used as `Arc<dyn TodoStorage>`.
pub trait TodoStorage: Send + Sync {
    /// Overwrites the stored snapshot
    ///
    /// Implementations must ignore a snapshot older (by `revision`) than one
    /// already written, since saves may complete out of order.
    fn save(&self, snapshot: Snapshot) -> StorageFuture<'_, Result<(), StorageError>>;

    /// Loads the stored snapshot, or an empty one if there is none or it
    /// cannot be read
    fn load(&self) -> StorageFuture<'_, Snapshot>;
}

/// Stores the snapshot as pretty-printed JSON in `<dir>/<key>.json`
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    last_revision: Mutex<Option<u64>>,
}

impl JsonFileStorage {
    /// Storage for `key` under `dir`
    ///
    /// Characters outside `[A-Za-z0-9_-]` in the key are replaced with `_`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        Self {
            path: dir.as_ref().join(format!("{file_name}.json")),
            last_revision: Mutex::new(None),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored snapshot, distinguishing "nothing saved" from failure
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read and
    /// [`StorageError::Deserialize`] if it is not a valid snapshot.
    pub async fn try_load(&self) -> Result<Option<Snapshot>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(StorageError::Deserialize)?;
        *self.last_revision.lock().await = Some(snapshot.revision);
        Ok(Some(snapshot))
    }

    async fn write(&self, snapshot: Snapshot) -> Result<(), StorageError> {
        let mut last_revision = self.last_revision.lock().await;

        if let Some(last) = *last_revision {
            if snapshot.revision < last {
                tracing::debug!(
                    revision = snapshot.revision,
                    last_written = last,
                    "Skipping stale snapshot"
                );
                return Ok(());
            }
        }

        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(StorageError::Serialize)?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        *last_revision = Some(snapshot.revision);
        tracing::debug!(
            path = %self.path.display(),
            revision = snapshot.revision,
            todos = snapshot.todos.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}

impl TodoStorage for JsonFileStorage {
    fn save(&self, snapshot: Snapshot) -> StorageFuture<'_, Result<(), StorageError>> {
        Box::pin(self.write(snapshot))
    }

    fn load(&self) -> StorageFuture<'_, Snapshot> {
        Box::pin(async move {
            match self.try_load().await {
                Ok(Some(snapshot)) => {
                    tracing::info!(
                        path = %self.path.display(),
                        todos = snapshot.todos.len(),
                        "Loaded saved todos"
                    );
                    snapshot
                },
                Ok(None) => {
                    tracing::debug!(path = %self.path.display(), "No saved todos, starting empty");
                    Snapshot::empty()
                },
                Err(error) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %error,
                        "Failed to load saved todos, starting empty"
                    );
                    Snapshot::empty()
                },
            }
        })
    }
}
