//! Acquisition coordination: dedup decisions and the fetch-and-persist
//! worker path.
//!
//! The coordinator owns the three entity-facing operations and the worker
//! path invoked per queue message. All collaborators are explicit handles
//! constructed once at process start and passed in; there is no ambient
//! global state.
//!
//! ## Idempotency
//!
//! `request_fetch` guarantees at most one status append and one enqueue
//! per call, and none at all once a document is stored. The worker path
//! is safe under duplicate delivery: the document store's conditional
//! write lets exactly one record land, and the COMPLETED status append is
//! correct whichever worker won.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use gazetteer_core::{CountryKey, CountryStore, Document, OperationStatus, StatusEntry, StatusLog};

use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::queue::{FetchRequest, WorkQueue};
use crate::source::CountrySource;

/// The response to a fetch request: the canonical key and where the
/// operation stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    /// The canonical country key.
    pub country: CountryKey,
    /// The operation status as of this request.
    pub status: OperationStatus,
}

/// Coordinates acquisition requests against the stores and the work queue.
pub struct AcquisitionCoordinator {
    countries: Arc<dyn CountryStore>,
    statuses: Arc<dyn StatusLog>,
    queue: Arc<dyn WorkQueue>,
    source: Arc<dyn CountrySource>,
    metrics: PipelineMetrics,
}

impl std::fmt::Debug for AcquisitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionCoordinator")
            .field("queue", &self.queue.queue_name())
            .finish()
    }
}

impl AcquisitionCoordinator {
    /// Creates a new coordinator over explicit store, queue, and source
    /// handles.
    #[must_use]
    pub fn new(
        countries: Arc<dyn CountryStore>,
        statuses: Arc<dyn StatusLog>,
        queue: Arc<dyn WorkQueue>,
        source: Arc<dyn CountrySource>,
    ) -> Self {
        Self {
            countries,
            statuses,
            queue,
            source,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Requests an asynchronous fetch for a country.
    ///
    /// Returns COMPLETED if a document is already stored (side-effect
    /// free), PENDING without enqueueing if a fetch is already in flight,
    /// and otherwise records PENDING and enqueues one work item.
    ///
    /// Two concurrent first-time callers can both pass the PENDING check
    /// before either append is visible and enqueue an extra work item.
    /// That duplicate is harmless: the worker path's conditional write
    /// stores exactly one record. This is at-most-one-in-practice, not a
    /// hard guarantee.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` for unusable names and propagates store
    /// and queue transport failures.
    #[tracing::instrument(skip(self), fields(country = tracing::field::Empty))]
    pub async fn request_fetch(&self, raw_name: &str) -> Result<FetchTicket> {
        let country = CountryKey::parse(raw_name)?;
        tracing::Span::current().record("country", tracing::field::display(&country));

        if self.countries.get(&country).await?.is_some() {
            tracing::debug!("document already stored");
            self.metrics.record_fetch_decision("completed");
            return Ok(FetchTicket {
                country,
                status: OperationStatus::Completed,
            });
        }

        let in_flight = matches!(
            self.statuses.latest(&country).await?,
            Some(entry) if entry.status == OperationStatus::Pending
        );
        if in_flight {
            tracing::debug!("fetch already in flight");
            self.metrics.record_fetch_decision("deduplicated");
            return Ok(FetchTicket {
                country,
                status: OperationStatus::Pending,
            });
        }

        self.statuses
            .append(&country, OperationStatus::Pending, None)
            .await?;
        let message_id = self
            .queue
            .send(&FetchRequest::new(country.clone()))
            .await?;
        tracing::info!(message_id = %message_id, "enqueued fetch request");
        self.metrics.record_fetch_decision("enqueued");

        Ok(FetchTicket {
            country,
            status: OperationStatus::Pending,
        })
    }

    /// Returns the stored document for a country.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` for unusable names and `NotFound` if no
    /// document is stored.
    #[tracing::instrument(skip(self))]
    pub async fn get_country(&self, raw_name: &str) -> Result<Document> {
        let country = CountryKey::parse(raw_name)?;
        self.countries
            .get(&country)
            .await?
            .ok_or_else(|| gazetteer_core::Error::not_found("country", &country).into())
    }

    /// Returns the current status entry for a country.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` for unusable names and `NotFound` if
    /// the key has no status history.
    #[tracing::instrument(skip(self))]
    pub async fn get_status(&self, raw_name: &str) -> Result<StatusEntry> {
        let country = CountryKey::parse(raw_name)?;
        self.statuses
            .latest(&country)
            .await?
            .ok_or_else(|| gazetteer_core::Error::not_found("operation", &country).into())
    }

    /// The worker path: fetch one country's document and persist it.
    ///
    /// Appends COMPLETED whether or not this worker's write landed; the
    /// recorded effect (document present, status completed) is the same
    /// either way. On fetch or store failure the FAILED entry is appended
    /// before the failure propagates. A failing FAILED append takes
    /// precedence over the original error: masking a status store outage
    /// would corrupt the history readers rely on.
    ///
    /// Returns `true` if this call's write created the record, `false` if
    /// a record already existed.
    ///
    /// # Errors
    ///
    /// Returns `FetchFailed` for upstream failures and propagates store
    /// transport failures.
    #[tracing::instrument(skip(self), fields(country = %country))]
    pub async fn fetch_and_persist(&self, country: &CountryKey) -> Result<bool> {
        match self.fetch_and_store(country).await {
            Ok(wrote) => {
                self.statuses
                    .append(country, OperationStatus::Completed, None)
                    .await?;
                self.metrics.record_source_fetch("success");
                tracing::info!(wrote = wrote, "fetch completed");
                Ok(wrote)
            }
            Err(err) => {
                self.statuses
                    .append(country, OperationStatus::Failed, Some(err.to_string()))
                    .await?;
                self.metrics.record_source_fetch("failure");
                tracing::warn!(error = %err, "fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch_and_store(&self, country: &CountryKey) -> Result<bool> {
        let document = self.source.fetch(country).await?;
        let wrote = self.countries.conditional_put(country, document).await?;
        if !wrote {
            tracing::debug!("document already present, write skipped");
        }
        Ok(wrote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gazetteer_core::store::memory::{MemoryCountryStore, MemoryStatusLog};
    use serde_json::json;

    use crate::error::Error;
    use crate::queue::memory::InMemoryWorkQueue;

    /// Source stub that serves a fixed document or a fixed failure.
    struct StubSource {
        outcome: std::result::Result<Document, String>,
    }

    impl StubSource {
        fn serving(document: Document) -> Self {
            Self {
                outcome: Ok(document),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                outcome: Err(reason.to_string()),
            }
        }
    }

    #[async_trait]
    impl CountrySource for StubSource {
        async fn fetch(&self, _key: &CountryKey) -> Result<Document> {
            self.outcome
                .clone()
                .map_err(Error::fetch_failed)
        }
    }

    struct Harness {
        coordinator: AcquisitionCoordinator,
        countries: Arc<MemoryCountryStore>,
        statuses: Arc<MemoryStatusLog>,
        queue: Arc<InMemoryWorkQueue>,
    }

    fn harness(source: StubSource) -> Harness {
        let countries = Arc::new(MemoryCountryStore::new());
        let statuses = Arc::new(MemoryStatusLog::new());
        let queue = Arc::new(InMemoryWorkQueue::new("fetch-queue"));
        let coordinator = AcquisitionCoordinator::new(
            Arc::clone(&countries) as Arc<dyn CountryStore>,
            Arc::clone(&statuses) as Arc<dyn StatusLog>,
            Arc::clone(&queue) as Arc<dyn WorkQueue>,
            Arc::new(source),
        );
        Harness {
            coordinator,
            countries,
            statuses,
            queue,
        }
    }

    fn key(name: &str) -> CountryKey {
        CountryKey::parse(name).unwrap()
    }

    #[tokio::test]
    async fn request_fetch_rejects_invalid_names() {
        let h = harness(StubSource::serving(json!({})));
        let err = h.coordinator.request_fetch("x!").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Core(gazetteer_core::Error::InvalidIdentifier { .. })
        ));
        assert_eq!(h.queue.depth().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn request_fetch_normalizes_before_use() {
        let h = harness(StubSource::serving(json!({})));
        let ticket = h.coordinator.request_fetch("New Zealand").await.unwrap();
        assert_eq!(ticket.country.as_str(), "new-zealand");
        assert_eq!(ticket.status, OperationStatus::Pending);
    }

    #[tokio::test]
    async fn request_fetch_returns_completed_without_side_effects() {
        let h = harness(StubSource::serving(json!({})));
        let france = key("france");
        h.countries
            .conditional_put(&france, json!({"name": "France"}))
            .await
            .unwrap();

        let ticket = h.coordinator.request_fetch("France").await.unwrap();
        assert_eq!(ticket.status, OperationStatus::Completed);
        assert_eq!(h.queue.depth().await.unwrap(), 0);
        assert!(h.statuses.history(&france).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_fetch_deduplicates_while_pending() {
        let h = harness(StubSource::serving(json!({})));

        let first = h.coordinator.request_fetch("France").await.unwrap();
        let second = h.coordinator.request_fetch("france").await.unwrap();

        assert_eq!(first.status, OperationStatus::Pending);
        assert_eq!(second.status, OperationStatus::Pending);
        // Exactly one work item and one status entry.
        assert_eq!(h.queue.depth().await.unwrap(), 1);
        assert_eq!(h.statuses.history(&key("france")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_fetch_after_failure_reenters_the_enqueue_branch() {
        let h = harness(StubSource::failing("upstream down"));
        let france = key("france");

        h.coordinator.request_fetch("France").await.unwrap();
        let err = h.coordinator.fetch_and_persist(&france).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { .. }));

        // FAILED is not PENDING and not COMPLETED: a renewed request
        // enqueues again.
        let ticket = h.coordinator.request_fetch("France").await.unwrap();
        assert_eq!(ticket.status, OperationStatus::Pending);
        assert_eq!(h.queue.depth().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn fetch_and_persist_stores_document_and_completes() {
        let h = harness(StubSource::serving(json!({"name": "France"})));
        let france = key("france");

        let wrote = h.coordinator.fetch_and_persist(&france).await.unwrap();
        assert!(wrote);

        let stored = h.countries.get(&france).await.unwrap().unwrap();
        assert_eq!(stored, json!({"name": "France"}));
        let latest = h.statuses.latest(&france).await.unwrap().unwrap();
        assert_eq!(latest.status, OperationStatus::Completed);
    }

    #[tokio::test]
    async fn fetch_and_persist_tolerates_losing_the_write_race() {
        let h = harness(StubSource::serving(json!({"name": "Late"})));
        let france = key("france");
        h.countries
            .conditional_put(&france, json!({"name": "First"}))
            .await
            .unwrap();

        let wrote = h.coordinator.fetch_and_persist(&france).await.unwrap();
        assert!(!wrote);

        // The earlier document survives; status still completes.
        let stored = h.countries.get(&france).await.unwrap().unwrap();
        assert_eq!(stored, json!({"name": "First"}));
        let latest = h.statuses.latest(&france).await.unwrap().unwrap();
        assert_eq!(latest.status, OperationStatus::Completed);
    }

    #[tokio::test]
    async fn fetch_and_persist_records_failure_reason() {
        let h = harness(StubSource::failing("no country found for 'france'"));
        let france = key("france");

        let err = h.coordinator.fetch_and_persist(&france).await.unwrap_err();
        assert!(err.to_string().contains("no country found"));

        let latest = h.statuses.latest(&france).await.unwrap().unwrap();
        assert_eq!(latest.status, OperationStatus::Failed);
        let reason = latest.error.unwrap();
        assert!(!reason.is_empty());
        assert!(reason.contains("no country found"));
        // No record was stored for the failed fetch.
        assert!(h.countries.get(&france).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_country_misses_are_not_found() {
        let h = harness(StubSource::serving(json!({})));
        let err = h.coordinator.get_country("atlantis").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Core(gazetteer_core::Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn get_status_misses_are_not_found() {
        let h = harness(StubSource::serving(json!({})));
        let err = h.coordinator.get_status("atlantis").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Core(gazetteer_core::Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn get_status_reads_the_latest_entry() {
        let h = harness(StubSource::serving(json!({"name": "France"})));

        h.coordinator.request_fetch("France").await.unwrap();
        assert_eq!(
            h.coordinator.get_status("france").await.unwrap().status,
            OperationStatus::Pending
        );

        h.coordinator.fetch_and_persist(&key("france")).await.unwrap();
        assert_eq!(
            h.coordinator.get_status("france").await.unwrap().status,
            OperationStatus::Completed
        );
    }
}
