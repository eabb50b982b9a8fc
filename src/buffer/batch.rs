use crate::domain::LogEntry;
use serde::{Deserialize, Serialize};

/// An ordered group of entries, the unit of transmission and of persistence.
///
/// Serializes as a bare JSON array of entry objects, which is both the wire
/// body and the on-disk format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogBatch {
    entries: Vec<LogEntry>,
}

impl LogBatch {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Concatenates two batches, `self` first.
    pub fn merged_with(mut self, later: LogBatch) -> LogBatch {
        self.entries.extend(later.entries);
        self
    }
}

impl From<Vec<LogEntry>> for LogBatch {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self::new(entries)
    }
}

impl IntoIterator for LogBatch {
    type Item = LogEntry;
    type IntoIter = std::vec::IntoIter<LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
