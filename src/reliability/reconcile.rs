use super::in_flight::{InFlightRequests, RequestId};
use crate::buffer::LogBuffer;
use crate::domain::Verbosity;
use crate::sender::{BatchSerializer, STATUS_ACCEPTED, TransportError};
use tracing::{info, warn};

/// Result of one transport call, routed back to the shipper service.
#[derive(Debug)]
pub struct Completion {
    pub request_id: RequestId,
    pub result: Result<u16, TransportError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed { reason: String, requeued: bool },
}

/// What happened to one in-flight batch, ready to be reported.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub request_id: RequestId,
    pub count: usize,
    pub status: DeliveryStatus,
    /// Entry dump, only rendered for `Verbosity::Verbose`.
    pub dump: Option<String>,
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }

    pub fn emit(&self, verbosity: Verbosity) {
        if verbosity == Verbosity::None {
            return;
        }
        let dump = self.dump.as_deref().map(|d| format!(" Logs:\n{d}")).unwrap_or_default();

        match &self.status {
            DeliveryStatus::Delivered => {
                info!(
                    request_id = %self.request_id,
                    count = self.count,
                    "{} log(s) sent successfully.{}",
                    self.count,
                    dump
                );
            }
            DeliveryStatus::Failed { reason, requeued } => {
                warn!(
                    request_id = %self.request_id,
                    count = self.count,
                    requeued = *requeued,
                    "Failed to send {} log(s) ({}). Sent later: {}.{}",
                    self.count,
                    reason,
                    if *requeued { "YES" } else { "NO" },
                    dump
                );
            }
        }
    }
}

/// Settles a finished request against the in-flight map and the buffer.
///
/// A 200 discards the batch. Anything else puts a non-empty batch back at
/// the head of the buffer so the next tick resends it ahead of newer entries.
/// A request that is no longer tracked (a stop discarded it) settles with a
/// count of zero and re-queues nothing.
pub fn reconcile(
    in_flight: &mut InFlightRequests,
    buffer: &mut LogBuffer,
    completion: Completion,
    verbosity: Verbosity,
) -> DeliveryReport {
    let Completion { request_id, result } = completion;
    let batch = in_flight.take(&request_id).unwrap_or_default();
    let count = batch.size();
    let dump = (verbosity == Verbosity::Verbose && !batch.is_empty())
        .then(|| BatchSerializer::new().render_pretty(&batch));

    let status = match result {
        Ok(STATUS_ACCEPTED) => DeliveryStatus::Delivered,
        failure => {
            let reason = match failure {
                Ok(status) => format!("HTTP {status}"),
                Err(e) => e.to_string(),
            };
            let requeued = !batch.is_empty();
            if requeued {
                buffer.prepend(batch);
            }
            DeliveryStatus::Failed { reason, requeued }
        }
    };

    DeliveryReport {
        request_id,
        count,
        status,
        dump,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::LogBatch;
    use crate::domain::{Fields, LogEntry};
    use serde_json::json;

    fn entry(message: &str) -> LogEntry {
        let mut fields = Fields::new();
        fields.insert("timestamp".to_string(), json!(1));
        fields.insert("message".to_string(), json!(message));
        LogEntry::new(fields)
    }

    fn messages(buffer: &LogBuffer) -> Vec<String> {
        buffer
            .iter()
            .filter_map(|e| e.message().map(str::to_string))
            .collect()
    }

    fn dispatched(in_flight: &mut InFlightRequests, messages: &[&str]) -> RequestId {
        let id = RequestId::new();
        in_flight.register(id, LogBatch::new(messages.iter().map(|m| entry(m)).collect()));
        id
    }

    #[test]
    fn test_success_discards_batch() {
        let mut in_flight = InFlightRequests::new();
        let mut buffer = LogBuffer::new();
        let id = dispatched(&mut in_flight, &["a", "b"]);

        let report = reconcile(
            &mut in_flight,
            &mut buffer,
            Completion { request_id: id, result: Ok(200) },
            Verbosity::Short,
        );

        assert!(report.is_delivered());
        assert_eq!(report.count, 2);
        assert!(report.dump.is_none());
        assert!(in_flight.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_non_200_requeues_ahead_of_newer_entries() {
        let mut in_flight = InFlightRequests::new();
        let mut buffer = LogBuffer::new();
        let id = dispatched(&mut in_flight, &["failed"]);
        buffer.push(entry("newer"));

        let report = reconcile(
            &mut in_flight,
            &mut buffer,
            Completion { request_id: id, result: Ok(503) },
            Verbosity::None,
        );

        assert_eq!(
            report.status,
            DeliveryStatus::Failed { reason: "HTTP 503".to_string(), requeued: true }
        );
        assert_eq!(messages(&buffer), vec!["failed", "newer"]);
        assert!(in_flight.is_empty());
    }

    #[test]
    fn test_other_2xx_counts_as_failure() {
        let mut in_flight = InFlightRequests::new();
        let mut buffer = LogBuffer::new();
        let id = dispatched(&mut in_flight, &["x"]);

        let report = reconcile(
            &mut in_flight,
            &mut buffer,
            Completion { request_id: id, result: Ok(204) },
            Verbosity::None,
        );

        assert!(!report.is_delivered());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_transport_error_requeues() {
        let mut in_flight = InFlightRequests::new();
        let mut buffer = LogBuffer::new();
        let id = dispatched(&mut in_flight, &["a", "b"]);

        let report = reconcile(
            &mut in_flight,
            &mut buffer,
            Completion { request_id: id, result: Err(TransportError::Timeout) },
            Verbosity::Verbose,
        );

        assert!(matches!(report.status, DeliveryStatus::Failed { requeued: true, .. }));
        assert!(report.dump.as_deref().is_some_and(|d| d.contains("\"a\"")));
        assert_eq!(messages(&buffer), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_request_settles_empty() {
        let mut in_flight = InFlightRequests::new();
        let mut buffer = LogBuffer::new();

        let report = reconcile(
            &mut in_flight,
            &mut buffer,
            Completion { request_id: RequestId::new(), result: Ok(500) },
            Verbosity::Verbose,
        );

        assert_eq!(report.count, 0);
        assert!(matches!(report.status, DeliveryStatus::Failed { requeued: false, .. }));
        assert!(buffer.is_empty());
    }
}
