//! # gazetteer-pipeline
//!
//! Asynchronous country-data acquisition pipeline for Gazetteer.
//!
//! This crate implements the acquisition domain:
//!
//! - **Dedup Coordination**: at most one in-flight fetch per country,
//!   idempotent re-requests after completion
//! - **Worker Path**: fetch-and-persist with write-once document storage
//! - **Batch Consumption**: at-least-once queue delivery turned into
//!   idempotent side effects with per-item failure reporting
//! - **Entry Gates**: validation and rate limiting as explicit middleware
//!
//! ## Guarantees
//!
//! - **Exactly-once-effective**: duplicate deliveries and duplicate
//!   enqueues converge on one stored record per country
//! - **Monotonic history**: status is append-only; the current status is
//!   resolved by `(timestamp, sequence)` at read time
//! - **Partial-batch isolation**: one item's failure never aborts its
//!   siblings or acknowledges their deliveries
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use gazetteer_core::prelude::*;
//! use gazetteer_pipeline::config::PipelineConfig;
//! use gazetteer_pipeline::coordinator::AcquisitionCoordinator;
//! use gazetteer_pipeline::queue::memory::InMemoryWorkQueue;
//! use gazetteer_pipeline::queue::WorkQueue;
//! use gazetteer_pipeline::source::RestCountriesSource;
//!
//! # fn main() -> gazetteer_pipeline::error::Result<()> {
//! let config = PipelineConfig::default();
//! let queue = Arc::new(InMemoryWorkQueue::with_receive_wait(
//!     "country-fetch-queue",
//!     config.receive_wait(),
//! ));
//! let source = Arc::new(RestCountriesSource::new(&config.source)?);
//!
//! let coordinator = AcquisitionCoordinator::new(
//!     Arc::new(MemoryCountryStore::new()),
//!     Arc::new(MemoryStatusLog::new()),
//!     queue as Arc<dyn WorkQueue>,
//!     source,
//! );
//! # let _ = coordinator;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod consumer;
pub mod coordinator;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod queue;
pub mod source;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{PipelineConfig, RateLimitConfig, SourceConfig};
    pub use crate::consumer::{BatchConsumer, BatchFailure, BatchOutcome};
    pub use crate::coordinator::{AcquisitionCoordinator, FetchTicket};
    pub use crate::error::{Error, Result};
    pub use crate::gate::{Gate, GateChain, PipelineOperation, RateLimitGate, ValidationGate};
    pub use crate::metrics::PipelineMetrics;
    pub use crate::queue::memory::InMemoryWorkQueue;
    pub use crate::queue::{Delivery, DeliveryToken, FetchRequest, WorkQueue};
    pub use crate::source::{CountrySource, RestCountriesSource};
}
