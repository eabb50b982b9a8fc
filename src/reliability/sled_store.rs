use super::persistence::{Persistence, PersistenceError};
use crate::buffer::LogBatch;
use futures::future::BoxFuture;
use std::path::Path;

const PENDING_LOGS_KEY: &[u8] = b"pending-logs";

/// Keeps the pending batch under a single key of an embedded sled database.
#[derive(Debug, Clone)]
pub struct SledPersistence {
    db: sled::Db,
}

impl SledPersistence {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl Persistence for SledPersistence {
    fn save(&self, batch: LogBatch) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move {
            let data = serde_json::to_vec(&batch)?;
            self.db.insert(PENDING_LOGS_KEY, data)?;
            self.db.flush()?;
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'_, Result<Option<LogBatch>, PersistenceError>> {
        Box::pin(async move {
            match self.db.get(PENDING_LOGS_KEY)? {
                Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
                None => Ok(None),
            }
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.db.remove(PENDING_LOGS_KEY)?;
            self.db.flush()?;
            Ok(())
        })
    }
}
