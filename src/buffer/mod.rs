//! In-memory queue of entries waiting for the next dispatch.

pub mod batch;
pub mod enrich;

pub use batch::LogBatch;
pub use enrich::{Clock, Enricher, SystemClock};

use crate::domain::LogEntry;
use std::collections::VecDeque;

/// Ordered queue of enriched, not-yet-sent entries.
///
/// The buffer is owned by the shipper service task and is never shared, so
/// it needs no interior locking.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
    }

    /// Moves every buffered entry into a batch, leaving the buffer empty.
    pub fn take_batch(&mut self) -> LogBatch {
        LogBatch::new(self.entries.drain(..).collect())
    }

    /// Puts `batch` ahead of everything currently buffered, keeping its order.
    pub fn prepend(&mut self, batch: LogBatch) {
        for entry in batch.into_entries().into_iter().rev() {
            self.entries.push_front(entry);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}
