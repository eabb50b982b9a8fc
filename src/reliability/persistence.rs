use crate::buffer::LogBatch;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Stored batch is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "disk-fallback")]
    #[error("Sled error: {0}")]
    SledError(#[from] sled::Error),
}

/// Port for keeping one pending batch across suspensions.
///
/// `clear` right after `load` must never lose what `load` returned.
pub trait Persistence: Send + Sync {
    /// Replaces whatever is stored with `batch`.
    fn save(&self, batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>>;

    fn load(&self) -> BoxFuture<'_, Result<Option<LogBatch>, PersistenceError>>;

    fn clear(&self) -> BoxFuture<'_, Result<(), PersistenceError>>;

    /// Stores `batch` after the batch already stored, so older entries stay
    /// first.
    fn add(&self, batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move {
            let merged = match self.load().await? {
                Some(stored) => stored.merged_with(batch),
                None => batch,
            };
            self.save(merged).await
        })
    }
}

/// Keeps nothing. Used when local persistence is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersistence;

impl Persistence for NoopPersistence {
    fn save(&self, _batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>> {
        futures::future::ready(Ok(())).boxed()
    }

    fn load(&self) -> BoxFuture<'_, Result<Option<LogBatch>, PersistenceError>> {
        futures::future::ready(Ok(None)).boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), PersistenceError>> {
        futures::future::ready(Ok(())).boxed()
    }
}

/// Process-local store; survives stop/start cycles but not restarts.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    stored: Mutex<Option<LogBatch>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<LogBatch> {
        self.stored.lock().clone()
    }
}

impl Persistence for MemoryPersistence {
    fn save(&self, batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>> {
        *self.stored.lock() = Some(batch);
        futures::future::ready(Ok(())).boxed()
    }

    fn load(&self) -> BoxFuture<'_, Result<Option<LogBatch>, PersistenceError>> {
        futures::future::ready(Ok(self.stored.lock().clone())).boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), PersistenceError>> {
        *self.stored.lock() = None;
        futures::future::ready(Ok(())).boxed()
    }
}

/// Stores the pending batch as a single JSON array file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "pending".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write(&self, batch: &LogBatch) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec(batch)?;
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(
            "Persisted {} log(s) to {} ({} bytes)",
            batch.size(),
            self.path.display(),
            data.len()
        );
        Ok(())
    }

    async fn read(&self) -> Result<Option<LogBatch>, PersistenceError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    async fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Persistence for FilePersistence {
    fn save(&self, batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move { self.write(&batch).await })
    }

    fn load(&self) -> BoxFuture<'_, Result<Option<LogBatch>, PersistenceError>> {
        Box::pin(self.read())
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(self.remove())
    }
}
