use crate::buffer::LogBatch;
use std::collections::HashMap;
use uuid::Uuid;

/// Identifier of one dispatch, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Batches handed to the transport and still waiting for a result.
#[derive(Debug, Default)]
pub struct InFlightRequests {
    requests: HashMap<RequestId, LogBatch>,
}

impl InFlightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: RequestId, batch: LogBatch) {
        self.requests.insert(id, batch);
    }

    /// Removes and returns the batch carried by `id`, if it is still tracked.
    pub fn take(&mut self, id: &RequestId) -> Option<LogBatch> {
        self.requests.remove(id)
    }

    /// Forgets every tracked request; their completions will find nothing.
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.requests.values().map(LogBatch::size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fields, LogEntry};

    fn batch_of(n: usize) -> LogBatch {
        LogBatch::new((0..n).map(|_| LogEntry::new(Fields::new())).collect())
    }

    #[test]
    fn test_register_and_take() {
        let mut in_flight = InFlightRequests::new();
        let first = RequestId::new();
        let second = RequestId::new();
        in_flight.register(first, batch_of(2));
        in_flight.register(second, batch_of(3));

        assert_ne!(first, second);
        assert_eq!(in_flight.len(), 2);
        assert_eq!(in_flight.entry_count(), 5);

        assert_eq!(in_flight.take(&first).map(|b| b.size()), Some(2));
        assert!(in_flight.take(&first).is_none());
        assert_eq!(in_flight.take(&second).map(|b| b.size()), Some(3));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut in_flight = InFlightRequests::new();
        let id = RequestId::new();
        in_flight.register(id, batch_of(1));

        in_flight.clear();

        assert!(in_flight.is_empty());
        assert!(in_flight.take(&id).is_none());
    }
}
