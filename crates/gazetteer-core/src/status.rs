//! Operation status model for acquisition lifecycle tracking.
//!
//! Each fetch operation for a country leaves an append-only trail of
//! [`StatusEntry`] records. The current status of a key is the entry with
//! the maximum `(timestamp, sequence)` pair; history is never compacted or
//! deleted by this subsystem.
//!
//! The state machine for a single key:
//!
//! ```text
//! ┌─────────┐  fetch succeeded   ┌───────────┐
//! │ PENDING │───────────────────►│ COMPLETED │  (terminal)
//! └─────────┘                    └───────────┘
//!      │  ▲
//!      │  │ re-request
//!      ▼  │
//! ┌─────────┐
//! │ FAILED  │
//! └─────────┘
//! ```
//!
//! COMPLETED is terminal: once a document is stored, requests are answered
//! directly and no further work is enqueued. FAILED is not terminal; a
//! renewed request re-enters the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::CountryKey;

/// Lifecycle status of a fetch operation.
///
/// Serialized in SCREAMING_SNAKE_CASE to match the wire values clients
/// already consume (`"PENDING"`, `"COMPLETED"`, `"FAILED"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// A fetch has been enqueued and not yet resolved.
    Pending,
    /// The document was fetched and stored.
    Completed,
    /// The most recent fetch attempt failed.
    Failed,
}

impl OperationStatus {
    /// Returns true if no further work will ever be scheduled for a key in
    /// this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One record in a country's append-only status history.
///
/// `timestamp` is wall-clock time assigned by the status log at append
/// time; `sequence` is a store-assigned per-key counter that breaks
/// timestamp collisions, so ordering is well-defined even when clocks are
/// not comparable across writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The country this entry belongs to.
    pub country: CountryKey,
    /// Wall-clock append time.
    pub timestamp: DateTime<Utc>,
    /// Store-assigned per-key tie-breaker, strictly increasing.
    pub sequence: u64,
    /// The recorded lifecycle status.
    pub status: OperationStatus,
    /// Failure reason; present iff `status` is [`OperationStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusEntry {
    /// Creates a PENDING entry.
    #[must_use]
    pub fn pending(country: CountryKey, timestamp: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            country,
            timestamp,
            sequence,
            status: OperationStatus::Pending,
            error: None,
        }
    }

    /// Creates a COMPLETED entry.
    #[must_use]
    pub fn completed(country: CountryKey, timestamp: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            country,
            timestamp,
            sequence,
            status: OperationStatus::Completed,
            error: None,
        }
    }

    /// Creates a FAILED entry carrying the failure reason.
    #[must_use]
    pub fn failed(
        country: CountryKey,
        timestamp: DateTime<Utc>,
        sequence: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            country,
            timestamp,
            sequence,
            status: OperationStatus::Failed,
            error: Some(error.into()),
        }
    }

    /// The ordering key used to resolve the current status at read time.
    #[must_use]
    pub fn ordering_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}
