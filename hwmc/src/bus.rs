//! Monitor Point Bus.
//!
//! - [`ingest`] - Producer handle, ingest loop and rotating persistence
//! - [`subscription`] - Subscriber filters
//! - [`broadcast`] - TCP fan-out server

pub mod broadcast;
pub mod ingest;
pub mod subscription;

pub use broadcast::BroadcastServer;
pub use ingest::{BusHandle, EncodedRecord, MonitorBus};
pub use subscription::{Filter, FilterError, Subscription};
