pub mod in_flight;
pub mod persistence;
pub mod reconcile;
#[cfg(feature = "disk-fallback")]
pub mod sled_store;

pub use in_flight::{InFlightRequests, RequestId};
pub use persistence::{
    FilePersistence, MemoryPersistence, NoopPersistence, Persistence, PersistenceError,
};
pub use reconcile::{Completion, DeliveryReport, DeliveryStatus, reconcile};
#[cfg(feature = "disk-fallback")]
pub use sled_store::SledPersistence;
