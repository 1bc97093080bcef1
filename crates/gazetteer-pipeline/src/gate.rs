//! Entry-point gates: validation and rate limiting as explicit middleware.
//!
//! Each entity-facing operation passes through an ordered chain of
//! capability objects before reaching the coordinator. A gate either
//! allows the call or short-circuits with a typed error; the chain stops
//! at the first refusal. This replaces implicit cross-cutting wrappers
//! with composition the caller can see and test.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use gazetteer_core::CountryKey;

use crate::config::RateLimitConfig;
use crate::error::{Error, Result};

/// The three entity-facing pipeline operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOperation {
    /// Request an asynchronous fetch for a country.
    RequestFetch,
    /// Read a stored country document.
    GetCountry,
    /// Read the current operation status for a country.
    GetStatus,
}

impl std::fmt::Display for PipelineOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFetch => write!(f, "request_fetch"),
            Self::GetCountry => write!(f, "get_country"),
            Self::GetStatus => write!(f, "get_status"),
        }
    }
}

/// One capability in the entry-point chain.
///
/// Gates see the caller identity, the operation, and the raw (not yet
/// normalized) country name, and short-circuit with a typed error.
#[async_trait]
pub trait Gate: Send + Sync {
    /// Allows the call or refuses it with a typed error.
    async fn check(
        &self,
        caller: &str,
        operation: PipelineOperation,
        raw_name: &str,
    ) -> Result<()>;
}

/// Refuses names that cannot become canonical keys.
///
/// Runs first so invalid input is refused before it can consume a rate
/// limit token or reach the coordinator.
#[derive(Debug, Default)]
pub struct ValidationGate;

impl ValidationGate {
    /// Creates a new validation gate.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Gate for ValidationGate {
    async fn check(
        &self,
        _caller: &str,
        _operation: PipelineOperation,
        raw_name: &str,
    ) -> Result<()> {
        CountryKey::parse(raw_name)?;
        Ok(())
    }
}

/// Per-caller, per-operation rate limiter.
type CallerLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Enforces per-operation quotas keyed by caller identity.
///
/// Limiters are created lazily per `(caller, operation)` pair. When
/// disabled, every call is allowed (the service degrades to unlimited
/// rather than unavailable when no limiter backend is configured).
pub struct RateLimitGate {
    config: RateLimitConfig,
    limiters: RwLock<HashMap<(String, PipelineOperation), Arc<CallerLimiter>>>,
}

impl std::fmt::Debug for RateLimitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGate")
            .field("config", &self.config)
            .field("limiters", &"<HashMap>")
            .finish()
    }
}

impl RateLimitGate {
    /// Creates a new rate-limit gate with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Gets or creates the limiter for a `(caller, operation)` pair.
    async fn get_or_create_limiter(
        &self,
        caller: &str,
        operation: PipelineOperation,
    ) -> Arc<CallerLimiter> {
        let lookup = (caller.to_string(), operation);

        // Fast path: limiter exists.
        {
            let read_guard = self.limiters.read().await;
            if let Some(limiter) = read_guard.get(&lookup) {
                return Arc::clone(limiter);
            }
        }

        // Slow path: create a new limiter.
        let mut write_guard = self.limiters.write().await;

        // Double-check after acquiring the write lock.
        if let Some(limiter) = write_guard.get(&lookup) {
            return Arc::clone(limiter);
        }

        let per_minute = self.config.limit_for(operation);
        let replenish_rate = NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.config.burst_size.max(1)).unwrap_or(NonZeroU32::MIN);

        let quota = Quota::per_minute(replenish_rate).allow_burst(burst);
        let limiter = Arc::new(RateLimiter::direct(quota));

        write_guard.insert(lookup, Arc::clone(&limiter));
        limiter
    }
}

#[async_trait]
impl Gate for RateLimitGate {
    async fn check(
        &self,
        caller: &str,
        operation: PipelineOperation,
        _raw_name: &str,
    ) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let limiter = self.get_or_create_limiter(caller, operation).await;
        let limit = self.config.limit_for(operation);

        match limiter.check() {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let retry_after =
                    not_until.wait_time_from(governor::clock::Clock::now(&DefaultClock::default()));
                tracing::warn!(
                    caller = caller,
                    operation = %operation,
                    limit = limit,
                    retry_after_secs = retry_after.as_secs(),
                    "rate limit exceeded"
                );
                Err(Error::RateLimited {
                    limit,
                    retry_after_secs: retry_after.as_secs(),
                })
            }
        }
    }
}

/// An ordered chain of gates; the first refusal wins.
#[derive(Default)]
pub struct GateChain {
    gates: Vec<Box<dyn Gate>>,
}

impl std::fmt::Debug for GateChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateChain")
            .field("gates", &self.gates.len())
            .finish()
    }
}

impl GateChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a gate to the chain.
    #[must_use]
    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    /// The standard entry-point chain: validation, then rate limiting.
    #[must_use]
    pub fn standard(rate_limits: RateLimitConfig) -> Self {
        Self::new()
            .with_gate(ValidationGate::new())
            .with_gate(RateLimitGate::new(rate_limits))
    }

    /// Runs every gate in order; returns the first refusal.
    ///
    /// # Errors
    ///
    /// Propagates the first gate error, typed per the refusing gate.
    pub async fn check(
        &self,
        caller: &str,
        operation: PipelineOperation,
        raw_name: &str,
    ) -> Result<()> {
        for gate in &self.gates {
            gate.check(caller, operation, raw_name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_limits() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            request_fetch_per_minute: 2,
            get_country_per_minute: 2,
            get_status_per_minute: 2,
            burst_size: 2,
        }
    }

    #[tokio::test]
    async fn validation_gate_refuses_invalid_names() {
        let gate = ValidationGate::new();
        let err = gate
            .check("10.0.0.1", PipelineOperation::RequestFetch, "x!")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid identifier"));

        gate.check("10.0.0.1", PipelineOperation::RequestFetch, "France")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rate_limit_allows_within_quota() {
        let gate = RateLimitGate::new(tight_limits());
        gate.check("caller-a", PipelineOperation::GetStatus, "france")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rate_limit_refuses_over_burst() {
        let gate = RateLimitGate::new(tight_limits());
        let mut refused = false;
        for _ in 0..10 {
            if let Err(err) = gate
                .check("caller-a", PipelineOperation::RequestFetch, "france")
                .await
            {
                assert!(matches!(err, Error::RateLimited { limit: 2, .. }));
                refused = true;
                break;
            }
        }
        assert!(refused, "burst of 10 should exceed a quota of 2");
    }

    #[tokio::test]
    async fn rate_limit_is_keyed_by_caller_and_operation() {
        let gate = RateLimitGate::new(tight_limits());

        // Exhaust caller-a's fetch quota.
        while gate
            .check("caller-a", PipelineOperation::RequestFetch, "france")
            .await
            .is_ok()
        {}

        // Other callers and other operations are unaffected.
        gate.check("caller-b", PipelineOperation::RequestFetch, "france")
            .await
            .unwrap();
        gate.check("caller-a", PipelineOperation::GetStatus, "france")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_limiter_allows_everything() {
        let gate = RateLimitGate::new(RateLimitConfig {
            enabled: false,
            ..tight_limits()
        });
        for _ in 0..100 {
            gate.check("caller-a", PipelineOperation::RequestFetch, "france")
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn chain_stops_at_first_refusal() {
        let chain = GateChain::standard(tight_limits());

        // Invalid input is refused by validation before it can consume a
        // rate limit token.
        let err = chain
            .check("caller-a", PipelineOperation::RequestFetch, "!!")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Core(_)));

        chain
            .check("caller-a", PipelineOperation::RequestFetch, "France")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_chain_allows_everything() {
        let chain = GateChain::new();
        chain
            .check("caller-a", PipelineOperation::GetCountry, "anything at all")
            .await
            .unwrap();
    }
}
