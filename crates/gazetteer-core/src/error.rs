//! Error types and result aliases shared across Gazetteer components.
//!
//! Errors are structured for programmatic handling: expected conditions
//! (invalid input, read-side misses) carry their own variants, while store
//! transport failures are propagated with their source attached rather than
//! swallowed.

use std::fmt;

/// The result type used throughout Gazetteer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core Gazetteer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A country name could not be normalized into a canonical key.
    #[error("invalid identifier: {message}")]
    InvalidIdentifier {
        /// Description of what made the name invalid.
        message: String,
    },

    /// The requested resource was not found.
    #[error("not found: {resource_type} '{id}'")]
    NotFound {
        /// The type of resource that was looked up.
        resource_type: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A store operation failed at the transport level.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new invalid-identifier error.
    #[must_use]
    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    #[must_use]
    pub fn not_found(resource_type: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn invalid_identifier_display() {
        let err = Error::invalid_identifier("too short");
        assert!(err.to_string().contains("invalid identifier"));
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("country", "atlantis");
        assert_eq!(err.to_string(), "not found: country 'atlantis'");
    }

    #[test]
    fn storage_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::storage_with_source("status log unreachable", source);
        assert!(err.to_string().contains("storage error"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn storage_error_without_source() {
        let err = Error::storage("lock poisoned");
        assert!(StdError::source(&err).is_none());
    }
}
