use crate::buffer::LogBatch;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Encodes batches into the ingestion wire format: one JSON array of entry
/// objects.
#[derive(Debug, Clone, Default)]
pub struct BatchSerializer;

impl BatchSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize_json_array(&self, batch: &LogBatch) -> Result<Bytes, SerializationError> {
        let encoded = serde_json::to_vec(batch)?;
        Ok(Bytes::from(encoded))
    }

    /// Multi-line rendering used by the verbose delivery report.
    pub fn render_pretty(&self, batch: &LogBatch) -> String {
        serde_json::to_string_pretty(batch).unwrap_or_else(|e| format!("<unprintable batch: {e}>"))
    }
}
