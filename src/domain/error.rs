use thiserror::Error;

/// Errors returned by the `LogShipper` handle.
///
/// Delivery problems (transport, serialization, persistence) never show up
/// here: the service handles them internally through logging and re-queueing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShipperError {
    #[error("API key required before logging")]
    MissingApiKey,

    #[error("A message or a non-empty set of fields is required")]
    InvalidLogInput,

    #[error("Invalid sending frequency: {0} seconds")]
    InvalidSendingFrequency(f64),

    #[error("Shipper service is no longer running")]
    ServiceClosed,
}
