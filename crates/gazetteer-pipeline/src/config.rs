//! Pipeline configuration.
//!
//! All knobs are plain serde-deserializable structs with conservative
//! defaults, so a deployment can supply partial configuration and rely on
//! the rest. Nothing here reads the environment; construction and wiring
//! happen once at process start.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gate::PipelineOperation;

/// Top-level configuration for the acquisition pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on the number of messages pulled per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Long-poll window for queue receives, in seconds.
    #[serde(default = "default_receive_wait_secs")]
    pub receive_wait_secs: u64,

    /// Upstream source client configuration.
    #[serde(default)]
    pub source: SourceConfig,

    /// Per-operation rate limiting configuration.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

const fn default_batch_size() -> usize {
    10
}

const fn default_receive_wait_secs() -> u64 {
    10
}

impl PipelineConfig {
    /// Returns the queue long-poll window as a duration.
    #[must_use]
    pub const fn receive_wait(&self) -> Duration {
        Duration::from_secs(self.receive_wait_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            receive_wait_secs: default_receive_wait_secs(),
            source: SourceConfig::default(),
            rate_limits: RateLimitConfig::default(),
        }
    }
}

/// Configuration for the upstream country-data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the source API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://restcountries.com/v3.1".to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_request_timeout_secs() -> u64 {
    10
}

impl SourceConfig {
    /// Returns the connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the whole-request timeout as a duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Rate limiting configuration.
///
/// Quotas are per caller per operation; status polling is allowed a higher
/// rate than the operations that can create work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Fetch requests per minute per caller.
    #[serde(default = "default_request_fetch_per_minute")]
    pub request_fetch_per_minute: u32,

    /// Document reads per minute per caller.
    #[serde(default = "default_get_country_per_minute")]
    pub get_country_per_minute: u32,

    /// Status reads per minute per caller.
    #[serde(default = "default_get_status_per_minute")]
    pub get_status_per_minute: u32,

    /// Maximum burst size (requests allowed above the steady rate).
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_request_fetch_per_minute() -> u32 {
    200
}

const fn default_get_country_per_minute() -> u32 {
    200
}

const fn default_get_status_per_minute() -> u32 {
    300
}

const fn default_burst_size() -> u32 {
    50
}

impl RateLimitConfig {
    /// Returns the per-minute quota for an operation.
    #[must_use]
    pub const fn limit_for(&self, operation: PipelineOperation) -> u32 {
        match operation {
            PipelineOperation::RequestFetch => self.request_fetch_per_minute,
            PipelineOperation::GetCountry => self.get_country_per_minute,
            PipelineOperation::GetStatus => self.get_status_per_minute,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            request_fetch_per_minute: default_request_fetch_per_minute(),
            get_country_per_minute: default_get_country_per_minute(),
            get_status_per_minute: default_get_status_per_minute(),
            burst_size: default_burst_size(),
        }
    }
}
