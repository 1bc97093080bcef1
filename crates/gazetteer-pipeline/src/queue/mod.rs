//! Work queue abstraction for fetch requests.
//!
//! This module provides:
//!
//! - [`WorkQueue`]: trait for the at-least-once delivery channel carrying
//!   fetch requests
//! - [`FetchRequest`]: the serializable message body
//! - [`Delivery`] / [`DeliveryToken`]: one received message and the opaque
//!   handle used to acknowledge it
//!
//! ## Design Principles
//!
//! - **Backend agnostic**: same interface for SQS-style brokers and the
//!   in-memory queue used in tests
//! - **At-least-once**: a message may be delivered more than once; the
//!   consumer's side effects must be idempotent
//! - **Explicit acknowledgment**: deliveries stay owned by the queue until
//!   deleted; unacknowledged items are redelivered by the queue's own
//!   retry/DLQ policy, never by this crate

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gazetteer_core::CountryKey;

use crate::error::Result;

/// The message body for one fetch request.
///
/// Wire format is `{"country":"france"}`; the key is canonical by the time
/// it is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// The canonical country to fetch.
    pub country: CountryKey,
}

impl FetchRequest {
    /// Creates a new fetch request.
    #[must_use]
    pub fn new(country: CountryKey) -> Self {
        Self { country }
    }

    /// Serializes the request to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::error::Error::serialization(format!("fetch request: {e}")))
    }
}

/// Opaque handle for acknowledging one delivery.
///
/// Owned by the queue; its lifetime ends when the consumer deletes it or
/// the queue reclaims the delivery after its visibility window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryToken(String);

impl DeliveryToken {
    /// Creates a token from its backend representation.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the backend representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One received message: the raw payload plus its acknowledgment token.
///
/// The payload is kept raw here; parsing and classification belong to the
/// consumer so that malformed bodies become per-item failures instead of
/// receive errors.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The raw message body.
    pub payload: String,
    /// The token acknowledging this specific delivery.
    pub token: DeliveryToken,
}

/// At-least-once message channel carrying fetch requests.
///
/// ## Thread Safety
///
/// All methods are `Send + Sync` to support concurrent access from any
/// number of stateless consumer processes.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueues a fetch request and returns the backend message id.
    async fn send(&self, request: &FetchRequest) -> Result<String>;

    /// Receives up to `max_messages` deliveries.
    ///
    /// This is a bounded-wait poll: implementations may wait up to their
    /// configured long-poll window for messages to arrive, and
    /// `max_messages` is an upper bound, not a guarantee. An empty vec is
    /// a normal result.
    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>>;

    /// Acknowledges (deletes) one delivery.
    ///
    /// Idempotent: deleting an unknown or already-deleted token succeeds.
    async fn delete(&self, token: &DeliveryToken) -> Result<()>;

    /// Returns the approximate number of visible messages.
    ///
    /// This is an estimate and may not be exact.
    async fn depth(&self) -> Result<usize>;

    /// Returns the queue's name or identifier.
    fn queue_name(&self) -> &str;
}
