//! In-memory store implementations for testing.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: no persistence, no distribution
//! - **Single-process only**: state is not visible across process
//!   boundaries
//!
//! Both stores are thread-safe via `RwLock` and honor the same contracts
//! as durable backends: `conditional_put` resolves write races, and
//! `latest` orders by `(timestamp, sequence)` at read time regardless of
//! append order.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CountryStore, Document, StatusLog};
use crate::error::{Error, Result};
use crate::key::CountryKey;
use crate::status::{OperationStatus, StatusEntry};

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("store lock poisoned")
}

/// In-memory country document store for testing.
#[derive(Debug, Default)]
pub struct MemoryCountryStore {
    records: RwLock<HashMap<CountryKey, Document>>,
}

impl MemoryCountryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.records.read().map_err(poison_err)?.len())
    }

    /// Returns true if no records are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.records.read().map_err(poison_err)?.is_empty())
    }
}

#[async_trait]
impl CountryStore for MemoryCountryStore {
    async fn conditional_put(&self, key: &CountryKey, document: Document) -> Result<bool> {
        let mut records = self.records.write().map_err(poison_err)?;
        if records.contains_key(key) {
            return Ok(false);
        }
        records.insert(key.clone(), document);
        Ok(true)
    }

    async fn get(&self, key: &CountryKey) -> Result<Option<Document>> {
        let records = self.records.read().map_err(poison_err)?;
        Ok(records.get(key).cloned())
    }
}

/// Per-key log state: append-ordered entries plus the next sequence value.
#[derive(Debug, Default)]
struct KeyHistory {
    next_sequence: u64,
    entries: Vec<StatusEntry>,
}

/// In-memory status log for testing.
#[derive(Debug, Default)]
pub struct MemoryStatusLog {
    state: RwLock<HashMap<CountryKey, KeyHistory>>,
}

impl MemoryStatusLog {
    /// Creates a new empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test support: appends an entry with an explicit timestamp.
    ///
    /// The sequence is still store-assigned, so entries appended out of
    /// timestamp order exercise the read-time ordering contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn append_at(
        &self,
        key: &CountryKey,
        status: OperationStatus,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<StatusEntry> {
        debug_assert_eq!(error.is_some(), status == OperationStatus::Failed);

        let mut state = self.state.write().map_err(poison_err)?;
        let history = state.entry(key.clone()).or_default();
        let sequence = history.next_sequence;
        history.next_sequence += 1;

        let entry = match status {
            OperationStatus::Pending => StatusEntry::pending(key.clone(), timestamp, sequence),
            OperationStatus::Completed => StatusEntry::completed(key.clone(), timestamp, sequence),
            OperationStatus::Failed => StatusEntry::failed(
                key.clone(),
                timestamp,
                sequence,
                error.unwrap_or_default(),
            ),
        };
        history.entries.push(entry.clone());
        drop(state);
        Ok(entry)
    }
}

#[async_trait]
impl StatusLog for MemoryStatusLog {
    async fn append(
        &self,
        key: &CountryKey,
        status: OperationStatus,
        error: Option<String>,
    ) -> Result<StatusEntry> {
        self.append_at(key, status, error, Utc::now())
    }

    async fn latest(&self, key: &CountryKey) -> Result<Option<StatusEntry>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.get(key).and_then(|history| {
            history
                .entries
                .iter()
                .max_by_key(|entry| entry.ordering_key())
                .cloned()
        }))
    }

    async fn history(&self, key: &CountryKey) -> Result<Vec<StatusEntry>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .get(key)
            .map(|history| history.entries.clone())
            .unwrap_or_default())
    }
}
