use crate::domain::{Fields, LogEntry, MESSAGE_KEY, ShipperError, TIMESTAMP_KEY};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Source of enrichment timestamps.
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Turns a raw `log` call into a `LogEntry`.
#[derive(Clone)]
pub struct Enricher {
    clock: Arc<dyn Clock>,
}

impl Enricher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Builds `{timestamp, ...metadata, message, ...fields}`.
    ///
    /// Later keys win, so caller fields override metadata and an explicit
    /// `message` field overrides the message argument.
    pub fn enrich(
        &self,
        metadata: &Fields,
        fields: Option<&Fields>,
        message: &str,
    ) -> Result<LogEntry, ShipperError> {
        let fields = fields.filter(|f| !f.is_empty());
        if message.is_empty() && fields.is_none() {
            warn!("Dropping log call: a message or a non-empty set of fields is required");
            return Err(ShipperError::InvalidLogInput);
        }

        let mut entry = Fields::with_capacity(
            1 + metadata.len() + 1 + fields.map_or(0, Fields::len),
        );
        entry.insert(
            TIMESTAMP_KEY.to_string(),
            Value::from(self.clock.now_millis()),
        );
        for (key, value) in metadata {
            entry.insert(key.clone(), value.clone());
        }
        if !message.is_empty() {
            entry.insert(MESSAGE_KEY.to_string(), Value::from(message));
        }
        if let Some(fields) = fields {
            for (key, value) in fields {
                entry.insert(key.clone(), value.clone());
            }
        }

        Ok(LogEntry::new(entry))
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher").finish_non_exhaustive()
    }
}
