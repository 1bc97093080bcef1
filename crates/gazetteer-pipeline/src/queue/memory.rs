//! In-memory work queue implementation for testing.
//!
//! This module provides [`InMemoryWorkQueue`], a simple in-memory
//! implementation of the [`WorkQueue`] trait suitable for testing and
//! development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: no persistence, no distribution
//! - **Single-process only**: messages are not visible across process
//!   boundaries
//! - **No visibility timer**: received messages stay in flight until
//!   deleted or explicitly returned via [`redeliver_in_flight`]
//!
//! At-least-once semantics hold by construction: a delivery that is never
//! deleted can be returned to the visible queue and received again.
//!
//! [`redeliver_in_flight`]: InMemoryWorkQueue::redeliver_in_flight

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Notify;
use ulid::Ulid;

use super::{Delivery, DeliveryToken, FetchRequest, WorkQueue};
use crate::error::{Error, Result};

/// A message at rest or in flight.
#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    payload: String,
}

/// Internal queue state protected by a single lock.
#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<DeliveryToken, StoredMessage>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::Core(gazetteer_core::Error::storage("work queue lock poisoned"))
}

/// In-memory work queue for testing.
///
/// Thread-safe via `RwLock`. Receive honors a configurable bounded wait,
/// mirroring a broker's long-poll window: with a zero wait (the default)
/// an empty queue returns immediately.
#[derive(Debug)]
pub struct InMemoryWorkQueue {
    name: String,
    state: RwLock<QueueState>,
    arrivals: Notify,
    receive_wait: Duration,
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new("default")
    }
}

impl InMemoryWorkQueue {
    /// Creates a new in-memory work queue with no receive wait.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_receive_wait(name, Duration::ZERO)
    }

    /// Creates a queue whose `receive` waits up to `receive_wait` for
    /// messages to arrive before returning an empty batch.
    #[must_use]
    pub fn with_receive_wait(name: impl Into<String>, receive_wait: Duration) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(QueueState::default()),
            arrivals: Notify::new(),
            receive_wait,
        }
    }

    /// Generates a new message id.
    fn generate_message_id() -> String {
        Ulid::new().to_string()
    }

    /// Test support: enqueues an arbitrary raw payload.
    ///
    /// Lets tests exercise the consumer's malformed-payload handling
    /// without going through [`FetchRequest`] serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn send_raw(&self, payload: impl Into<String>) -> Result<String> {
        let message_id = Self::generate_message_id();
        let mut state = self.state.write().map_err(poison_err)?;
        state.visible.push_back(StoredMessage {
            message_id: message_id.clone(),
            payload: payload.into(),
        });
        drop(state);
        self.arrivals.notify_waiters();
        Ok(message_id)
    }

    /// Returns all in-flight deliveries to the visible queue.
    ///
    /// Models the expiry of a broker's visibility window: unacknowledged
    /// messages become receivable again with fresh tokens. Returns the
    /// number of messages redelivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn redeliver_in_flight(&self) -> Result<usize> {
        let mut state = self.state.write().map_err(poison_err)?;
        let redelivered = state.in_flight.len();
        let messages: Vec<_> = state.in_flight.drain().map(|(_, message)| message).collect();
        for message in messages {
            state.visible.push_back(message);
        }
        drop(state);
        if redelivered > 0 {
            self.arrivals.notify_waiters();
        }
        Ok(redelivered)
    }

    /// Returns the number of deliveries currently awaiting acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn in_flight_len(&self) -> Result<usize> {
        Ok(self.state.read().map_err(poison_err)?.in_flight.len())
    }

    /// Takes up to `max_messages` visible messages into flight.
    fn take_batch(&self, max_messages: usize) -> Result<Vec<Delivery>> {
        let mut state = self.state.write().map_err(poison_err)?;
        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let Some(message) = state.visible.pop_front() else {
                break;
            };
            let token = DeliveryToken::new(Ulid::new().to_string());
            batch.push(Delivery {
                payload: message.payload.clone(),
                token: token.clone(),
            });
            state.in_flight.insert(token, message);
        }
        drop(state);
        Ok(batch)
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn send(&self, request: &FetchRequest) -> Result<String> {
        let payload = request.to_json()?;
        self.send_raw(payload)
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>> {
        if max_messages == 0 {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + self.receive_wait;
        loop {
            let batch = self.take_batch(max_messages)?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Vec::new());
            }
            // Wake on arrival or give up at the long-poll deadline.
            let _ = tokio::time::timeout(remaining, self.arrivals.notified()).await;
        }
    }

    async fn delete(&self, token: &DeliveryToken) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.in_flight.remove(token);
        Ok(())
    }

    async fn depth(&self) -> Result<usize> {
        Ok(self.state.read().map_err(poison_err)?.visible.len())
    }

    fn queue_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazetteer_core::CountryKey;

    fn request(name: &str) -> FetchRequest {
        FetchRequest::new(CountryKey::parse(name).unwrap())
    }

    #[tokio::test]
    async fn send_receive_delete() {
        let queue = InMemoryWorkQueue::new("test");

        queue.send(&request("france")).await.unwrap();
        assert_eq!(queue.depth().await.unwrap(), 1);

        let batch = queue.receive(10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].payload, r#"{"country":"france"}"#);
        assert_eq!(queue.depth().await.unwrap(), 0);
        assert_eq!(queue.in_flight_len().unwrap(), 1);

        queue.delete(&batch[0].token).await.unwrap();
        assert_eq!(queue.in_flight_len().unwrap(), 0);
    }

    #[tokio::test]
    async fn receive_respects_batch_bound() {
        let queue = InMemoryWorkQueue::new("test");
        for name in ["france", "germany", "spain"] {
            queue.send(&request(name)).await.unwrap();
        }

        let batch = queue.receive(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.depth().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_queue_returns_empty_batch() {
        let queue = InMemoryWorkQueue::new("test");
        assert!(queue.receive(10).await.unwrap().is_empty());
        assert!(queue.receive(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn undeleted_messages_can_be_redelivered() {
        let queue = InMemoryWorkQueue::new("test");
        queue.send(&request("france")).await.unwrap();

        let first = queue.receive(10).await.unwrap();
        assert_eq!(first.len(), 1);

        // Consumer crashed: nothing deleted, visibility window expires.
        assert_eq!(queue.redeliver_in_flight().unwrap(), 1);

        let second = queue.receive(10).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].payload, first[0].payload);
        // Redelivery carries a fresh token.
        assert_ne!(second[0].token, first[0].token);
    }

    #[tokio::test]
    async fn delete_unknown_token_is_idempotent() {
        let queue = InMemoryWorkQueue::new("test");
        queue
            .delete(&DeliveryToken::new("never-issued"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn receive_waits_for_arrival() {
        let queue = std::sync::Arc::new(InMemoryWorkQueue::with_receive_wait(
            "test",
            Duration::from_secs(5),
        ));

        let receiver = {
            let queue = std::sync::Arc::clone(&queue);
            tokio::spawn(async move { queue.receive(1).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.send(&request("france")).await.unwrap();

        let batch = receiver.await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn queue_name() {
        let queue = InMemoryWorkQueue::new("fetch-queue");
        assert_eq!(queue.queue_name(), "fetch-queue");
    }
}
