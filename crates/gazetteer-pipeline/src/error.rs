//! Error types for the acquisition pipeline domain.
//!
//! The taxonomy separates conditions by who resolves them: client input
//! errors surface through [`gazetteer_core::Error`], per-item batch
//! failures are reported to the queue's redelivery policy, and store
//! transport failures propagate untouched. Nothing in this crate retries
//! internally.

/// The result type used throughout the acquisition pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The upstream data source failed to produce a document.
    ///
    /// Transient or permanent; safe to retry via a renewed fetch request
    /// since FAILED status is not terminal.
    #[error("fetch failed: {message}")]
    FetchFailed {
        /// Description of the upstream failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A queue message body could not be parsed at all.
    ///
    /// Redelivery will hit the same payload; these route to the external
    /// dead-letter policy rather than being re-parsed here.
    #[error("malformed payload: {message}")]
    MalformedPayload {
        /// Description of the parse failure.
        message: String,
    },

    /// A queue message parsed but carries no usable country field.
    #[error("message is missing the 'country' field")]
    MissingKey,

    /// A caller exceeded its per-operation quota.
    #[error("rate limit exceeded: {limit} requests per minute, retry after {retry_after_secs}s")]
    RateLimited {
        /// The configured per-minute limit.
        limit: u32,
        /// Seconds until the caller may retry.
        retry_after_secs: u64,
    },

    /// A serialization error occurred at the queue boundary.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An error from gazetteer-core (invalid identifiers, read misses,
    /// store transport failures).
    #[error("core error: {0}")]
    Core(#[from] gazetteer_core::Error),
}

impl Error {
    /// Creates a new fetch-failed error.
    #[must_use]
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new fetch-failed error with a source cause.
    #[must_use]
    pub fn fetch_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::FetchFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new malformed-payload error.
    #[must_use]
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns true if redelivering the originating message could succeed.
    ///
    /// Structurally unusable payloads never become usable on redelivery;
    /// upstream and store failures can.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::FetchFailed { .. } => true,
            Self::MalformedPayload { .. } | Self::MissingKey | Self::RateLimited { .. } => false,
            Self::Serialization { .. } => false,
            Self::Core(core) => matches!(core, gazetteer_core::Error::Storage { .. }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn fetch_failed_display() {
        let err = Error::fetch_failed("upstream returned 503");
        assert!(err.to_string().contains("fetch failed"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn fetch_failed_carries_source() {
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::fetch_failed_with_source("request timed out", source);
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn core_errors_convert() {
        let err: Error = gazetteer_core::Error::invalid_identifier("too short").into();
        assert!(err.to_string().contains("invalid identifier"));
    }

    #[test]
    fn retryability_classification() {
        assert!(Error::fetch_failed("upstream down").is_retryable());
        assert!(
            Error::Core(gazetteer_core::Error::storage("unreachable")).is_retryable()
        );

        assert!(!Error::malformed_payload("bad json").is_retryable());
        assert!(!Error::MissingKey.is_retryable());
        assert!(
            !Error::Core(gazetteer_core::Error::invalid_identifier("nope")).is_retryable()
        );
    }
}
