pub mod http;
pub mod serialization;

pub use http::{ClientConfig, ConnectionStats, HttpTransport};
pub use serialization::{BatchSerializer, SerializationError};

use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use thiserror::Error;

/// HTTP status the ingestion endpoint answers with when it accepted a batch.
pub const STATUS_ACCEPTED: u16 = 200;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Transmission timeout")]
    Timeout,
}

/// One serialized batch on its way to the ingestion endpoint.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub api_key: String,
    pub body: Bytes,
    pub headers: BTreeMap<String, String>,
}

/// Port for delivering serialized batches.
///
/// Implementations must resolve every returned future exactly once, with
/// the HTTP status code on a completed exchange or an error when no status
/// could be obtained.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<u16, TransportError>>;
}
