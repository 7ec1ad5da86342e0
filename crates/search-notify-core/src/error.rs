//! Error types for the search notifier
//!
//! Uses `thiserror` with full context preservation. The taxonomy splits
//! along the recovery boundary: [`ConfigError`] is fatal at startup,
//! [`PublishError`] is recoverable at the interceptor (logged, counted,
//! then dropped, never surfaced to the proxied request).

use std::time::Duration;
use thiserror::Error;

/// Result type alias for publish operations
pub type Result<T, E = PublishError> = std::result::Result<T, E>;

/// Fatal configuration errors, surfaced at startup.
///
/// The interceptor must not start with an invalid policy or an
/// unparseable broker URI.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Broker connection URI does not parse
    #[error("invalid broker URI `{uri}`: {reason}")]
    BrokerUri { uri: String, reason: String },

    /// Topic name is empty or whitespace
    #[error("topic name must not be empty")]
    EmptyTopicName,

    /// Method allow-list entry is not a valid HTTP method
    #[error("unknown HTTP method `{0}` in notify_methods")]
    Method(String),

    /// Prefix whitelist entry lacks the wildcard marker
    #[error("header prefix `{0}` must be terminated with `*`")]
    PrefixMarker(String),

    /// Exact-name whitelist entry carries a wildcard
    #[error("exact header name `{0}` must not contain `*`")]
    WildcardInName(String),

    /// Underlying configuration source failed to load or deserialize
    #[error("configuration load failed: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors from a single publish attempt.
///
/// Delivery is at-most-once from the core's perspective: one failed
/// attempt is reported to the caller, not retried here.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Broker unreachable, connection stale beyond recovery, or the
    /// broker rejected the write
    #[error("broker connection failure: {message}")]
    ConnectionFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Envelope could not be serialized to the wire format
    #[error("envelope encoding failure: {message}")]
    EncodingFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The bounded publish attempt did not complete in time
    #[error("publish attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl PublishError {
    /// Create a connection failure
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failure with source
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an encoding failure with source
    pub fn encoding_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::EncodingFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailure { .. } => "connection",
            Self::EncodingFailure { .. } => "encoding",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Check if the error may resolve on its own
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::EncodingFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(PublishError::connection("down").kind(), "connection");
        assert_eq!(
            PublishError::timeout(Duration::from_secs(2)).kind(),
            "timeout"
        );
    }

    #[test]
    fn encoding_failures_are_not_transient() {
        let err = PublishError::EncodingFailure {
            message: "bad".into(),
            source: None,
        };
        assert!(!err.is_transient());
        assert!(PublishError::connection("down").is_transient());
    }
}
