//! Batch consumption of fetch requests from the work queue.
//!
//! The consumer turns at-least-once delivery into correct side effects:
//! each item in a batch is classified and processed in isolation, every
//! success is acknowledged individually, and failures are reported as a
//! structured per-item list for the queue's own redelivery/DLQ policy.
//! One item's failure never aborts its siblings, and a failed item is
//! never acknowledged.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use gazetteer_core::CountryKey;

use crate::coordinator::AcquisitionCoordinator;
use crate::error::{Error, Result};
use crate::metrics::PipelineMetrics;
use crate::queue::{Delivery, DeliveryToken, WorkQueue};

/// One item the caller should consider NOT acknowledged.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// The delivery token of the failed item.
    #[serde(skip)]
    pub token: DeliveryToken,
    /// Human-readable failure reason.
    pub reason: String,
}

/// The result of processing one delivered batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    /// Number of items processed successfully (and acknowledged).
    pub processed: usize,
    /// Items left for the queue's redelivery mechanism.
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Returns true if every item in the batch succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drains the work queue in batches through the coordinator's worker path.
///
/// Stateless: any number of consumers may run concurrently against the
/// same queue; correctness under duplicate delivery comes from the worker
/// path, not from consumer coordination.
pub struct BatchConsumer {
    coordinator: Arc<AcquisitionCoordinator>,
    queue: Arc<dyn WorkQueue>,
    batch_size: usize,
    metrics: PipelineMetrics,
}

impl std::fmt::Debug for BatchConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConsumer")
            .field("queue", &self.queue.queue_name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl BatchConsumer {
    /// Creates a new consumer.
    #[must_use]
    pub fn new(
        coordinator: Arc<AcquisitionCoordinator>,
        queue: Arc<dyn WorkQueue>,
        batch_size: usize,
    ) -> Self {
        Self {
            coordinator,
            queue,
            batch_size,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Receives one batch and processes it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the receive itself fails; item-level
    /// failures are reported in the outcome.
    pub async fn run_once(&self) -> Result<BatchOutcome> {
        let deliveries = self.queue.receive(self.batch_size).await?;
        if let Ok(depth) = self.queue.depth().await {
            self.metrics.set_queue_depth(depth);
        }
        Ok(self.process_batch(deliveries).await)
    }

    /// Processes one delivered batch of work items.
    ///
    /// For each item: classify the payload, run the worker path, and
    /// acknowledge on success. Failures are collected with their delivery
    /// tokens; the caller (or the queue's own policy) owns redelivery of
    /// listed items.
    pub async fn process_batch(&self, deliveries: Vec<Delivery>) -> BatchOutcome {
        let span = gazetteer_core::observability::consumer_span(
            self.queue.queue_name(),
            deliveries.len(),
        );
        self.process_batch_inner(deliveries).instrument(span).await
    }

    async fn process_batch_inner(&self, deliveries: Vec<Delivery>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for delivery in deliveries {
            match self.process_delivery(&delivery).await {
                Ok(()) => {
                    outcome.processed += 1;
                    self.metrics.record_batch_item("processed");
                    if let Err(err) = self.queue.delete(&delivery.token).await {
                        // The item's side effects are durable and
                        // idempotent; the redelivered copy will no-op.
                        tracing::warn!(
                            token = %delivery.token,
                            error = %err,
                            "failed to delete acknowledged delivery"
                        );
                    }
                }
                Err(err) => {
                    self.metrics.record_batch_item(outcome_label(&err));
                    tracing::warn!(
                        token = %delivery.token,
                        error = %err,
                        retryable = err.is_retryable(),
                        "work item failed"
                    );
                    outcome.failures.push(BatchFailure {
                        token: delivery.token,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            processed = outcome.processed,
            failed = outcome.failures.len(),
            "batch processed"
        );
        outcome
    }

    /// Classifies and processes one delivery.
    async fn process_delivery(&self, delivery: &Delivery) -> Result<()> {
        let country = parse_payload(&delivery.payload)?;
        self.coordinator.fetch_and_persist(&country).await?;
        Ok(())
    }
}

/// Parses a raw message payload into a country key.
///
/// Classification order matters: unparsable bodies are `MalformedPayload`,
/// parseable bodies without a usable `country` field are `MissingKey`, and
/// only then is the key itself validated. The worker path is never invoked
/// for a payload that fails here.
fn parse_payload(payload: &str) -> Result<CountryKey> {
    let body: Value = serde_json::from_str(payload)
        .map_err(|e| Error::malformed_payload(format!("invalid JSON: {e}")))?;

    let raw = body
        .get("country")
        .and_then(Value::as_str)
        .ok_or(Error::MissingKey)?;
    if raw.is_empty() {
        return Err(Error::MissingKey);
    }

    Ok(CountryKey::parse(raw)?)
}

/// The metrics label for a failed item.
fn outcome_label(err: &Error) -> &'static str {
    match err {
        Error::MalformedPayload { .. } => "malformed_payload",
        Error::MissingKey => "missing_key",
        Error::FetchFailed { .. } => "fetch_failed",
        _ => "storage",
    }
}
