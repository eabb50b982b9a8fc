// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Millisecond timestamps fit comfortably in i64
    clippy::cast_precision_loss,      // Acceptable for durations and display
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. ShipperService in shipper module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod reliability;
pub mod sender;
pub mod shipper;

// Re-export main types for easy access
pub use app::{App, Config};
pub use domain::{Fields, LogEntry, ShipperError, Verbosity};
pub use reliability::{FilePersistence, MemoryPersistence, NoopPersistence, Persistence};
pub use sender::{HttpTransport, Transport};
pub use shipper::{LogShipper, ShipperConfig, ShipperService, ShipperStatus};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
