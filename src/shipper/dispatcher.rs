use super::Settings;
use crate::buffer::LogBuffer;
use crate::reliability::{Completion, InFlightRequests, RequestId};
use crate::sender::{BatchSerializer, OutboundRequest, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Moves the buffer onto the wire once per tick.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    serializer: BatchSerializer,
    completions: mpsc::UnboundedSender<Completion>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            transport,
            serializer: BatchSerializer::new(),
            completions,
        }
    }

    /// Snapshots the buffer into one batch and hands it to the transport.
    ///
    /// Does nothing without an API key or with an empty buffer. The send runs
    /// on its own task; its result comes back on the completion channel. A
    /// batch that fails to serialize is dropped and never tracked.
    pub fn dispatch(
        &self,
        settings: &Settings,
        buffer: &mut LogBuffer,
        in_flight: &mut InFlightRequests,
    ) -> Option<RequestId> {
        let api_key = settings.api_key.as_ref()?;
        if buffer.is_empty() {
            return None;
        }

        let batch = buffer.take_batch();
        let body = match self.serializer.serialize_json_array(&batch) {
            Ok(body) => body,
            Err(e) => {
                error!("Dropping batch of {} log(s) that failed to serialize: {e}", batch.size());
                return None;
            }
        };

        let request_id = RequestId::new();
        debug!(
            "Dispatching request {} with {} log(s) ({} bytes)",
            request_id,
            batch.size(),
            body.len()
        );
        in_flight.register(request_id, batch);

        let send = self.transport.send(OutboundRequest {
            api_key: api_key.clone(),
            body,
            headers: settings.extra_headers.clone(),
        });
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = send.await;
            if completions.send(Completion { request_id, result }).is_err() {
                debug!("Shipper service gone; dropping result of request {request_id}");
            }
        });

        Some(request_id)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
