//! Domain layer for rask-log-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: an enriched record, an ordered JSON object
//! - `Verbosity`: how much the shipper reports about each delivery
//! - `ShipperError`: errors surfaced to callers of the shipper handle

pub mod error;
pub mod log_entry;
pub mod verbosity;

pub use error::ShipperError;
pub use log_entry::{Fields, LogEntry, MESSAGE_KEY, TIMESTAMP_KEY};
pub use verbosity::Verbosity;
