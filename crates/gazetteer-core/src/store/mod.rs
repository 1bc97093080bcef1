//! Pluggable storage for country documents and status history.
//!
//! Two stores back the acquisition pipeline:
//!
//! - [`CountryStore`]: durable key-value store for completed documents,
//!   write-once per key
//! - [`StatusLog`]: append-only per-key status history
//!
//! ## Design Principles
//!
//! - **Conditional writes**: the write-once guarantee rests on a
//!   write-iff-absent primitive, not on caller coordination
//! - **Read-time ordering**: status appends are unguarded; the current
//!   status is resolved by `(timestamp, sequence)` when read
//! - **Testability**: in-memory implementations for tests, a durable
//!   backend in production

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::key::CountryKey;
use crate::status::{OperationStatus, StatusEntry};

/// An opaque structured country document.
///
/// Content is immutable after creation; this subsystem never inspects it
/// beyond serialization.
pub type Document = serde_json::Value;

/// Durable key-value store for completed country documents.
///
/// ## Write-Once Semantics
///
/// `conditional_put` is the core primitive for exactly-once-effective
/// acquisition: when two workers race to store the same key, exactly one
/// write lands and the loser observes `false` rather than an error. A
/// precondition miss is a normal result, never an error.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Writes a document iff no record exists for the key.
    ///
    /// Returns `true` if this call created the record, `false` if a record
    /// already existed (the stored document is left untouched).
    async fn conditional_put(&self, key: &CountryKey, document: Document) -> Result<bool>;

    /// Reads the stored document for a key.
    ///
    /// Returns `None` if no record exists.
    async fn get(&self, key: &CountryKey) -> Result<Option<Document>>;
}

/// Append-only per-key status history.
///
/// Appends carry no conditional guard; concurrent appends for the same key
/// are all accepted and ordering is resolved purely at read time. The
/// store assigns each entry a wall-clock timestamp and a strictly
/// increasing per-key sequence that breaks timestamp collisions.
#[async_trait]
pub trait StatusLog: Send + Sync {
    /// Appends a status entry for a key and returns the stored entry.
    ///
    /// `error` must be `Some` iff `status` is [`OperationStatus::Failed`];
    /// implementations may debug-assert but do not enforce this at runtime.
    async fn append(
        &self,
        key: &CountryKey,
        status: OperationStatus,
        error: Option<String>,
    ) -> Result<StatusEntry>;

    /// Returns the current status entry for a key: the entry with the
    /// maximum `(timestamp, sequence)`, or `None` if no history exists.
    async fn latest(&self, key: &CountryKey) -> Result<Option<StatusEntry>>;

    /// Returns the full history for a key in append order.
    async fn history(&self, key: &CountryKey) -> Result<Vec<StatusEntry>>;
}
