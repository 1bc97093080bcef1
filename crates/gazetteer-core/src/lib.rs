//! # gazetteer-core
//!
//! Core abstractions for the Gazetteer country-data acquisition service.
//!
//! This crate provides the foundational types and traits used across all
//! Gazetteer components:
//!
//! - **Canonical Keys**: normalized, validated country identifiers
//! - **Status Model**: the append-only acquisition lifecycle history
//! - **Storage Traits**: write-once document store and status log
//!   abstractions, with in-memory backends for testing
//! - **Error Types**: shared error definitions and result types
//! - **Observability**: logging bootstrap and span constructors
//!
//! ## Crate Boundary
//!
//! `gazetteer-core` is the only crate allowed to define shared primitives.
//! The pipeline crate builds on these contracts and never reaches around
//! them.
//!
//! ## Example
//!
//! ```rust
//! use gazetteer_core::prelude::*;
//!
//! let key = CountryKey::parse("United States")?;
//! assert_eq!(key.as_str(), "united-states");
//! # Ok::<(), gazetteer_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod key;
pub mod observability;
pub mod status;
pub mod store;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use gazetteer_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::key::CountryKey;
    pub use crate::status::{OperationStatus, StatusEntry};
    pub use crate::store::memory::{MemoryCountryStore, MemoryStatusLog};
    pub use crate::store::{CountryStore, Document, StatusLog};
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use key::CountryKey;
pub use observability::{LogFormat, init_logging};
pub use status::{OperationStatus, StatusEntry};
pub use store::{CountryStore, Document, StatusLog};
