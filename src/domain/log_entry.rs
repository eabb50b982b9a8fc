use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the enrichment time in milliseconds since the Unix epoch.
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Key holding the free-form message, when one was given.
pub const MESSAGE_KEY: &str = "message";

/// Insertion-ordered JSON object used for caller fields and static metadata.
pub type Fields = Map<String, Value>;

/// A fully enriched log entry ready for batching and transmission.
///
/// This is the canonical representation of a log entry throughout the
/// shipper, from `LogShipper::log` through to the wire and to disk. It
/// serializes as a plain JSON object. There are no mutating accessors:
/// once built by the enricher an entry is never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry(Fields);

impl LogEntry {
    /// Wraps an already-enriched object as-is.
    pub fn new(fields: Fields) -> Self {
        Self(fields)
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.0.get(TIMESTAMP_KEY).and_then(Value::as_i64)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get(MESSAGE_KEY).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<LogEntry> for Value {
    fn from(entry: LogEntry) -> Self {
        Value::Object(entry.0)
    }
}
