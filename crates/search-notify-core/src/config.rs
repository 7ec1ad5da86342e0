//! Configuration for the search notifier
//!
//! Uses the `config` crate for layered configuration: built-in defaults,
//! an optional file, then `SEARCH_NOTIFY_*` environment variables. Keys
//! are flat so the host pipeline's filter section maps one-to-one.

use crate::error::ConfigError;
use crate::policy::AllowPolicy;
use crate::topic::{TopicConfig, TopicKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Recognized options for the side-channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Broker connection URI
    #[serde(default = "default_broker_connection")]
    pub broker_connection: String,

    /// Connection label, visible in broker-side monitoring
    #[serde(default = "default_connection_name")]
    pub connection_name: String,

    /// Logical topic name
    #[serde(default = "default_topic_name")]
    pub topic_name: String,

    /// Broker routing discipline: direct, fanout or topic
    #[serde(default)]
    pub topic_kind: TopicKind,

    /// Whether the topic survives broker restarts
    #[serde(default = "default_true")]
    pub topic_durable: bool,

    /// Whitespace-separated exact header names eligible for indexing
    #[serde(default = "default_index_headers")]
    pub index_headers: String,

    /// Whitespace-separated header-name prefixes eligible for indexing,
    /// each terminated with `*`
    #[serde(default = "default_index_headers_prefix")]
    pub index_headers_prefix: String,

    /// Whitespace-separated HTTP methods that trigger a publish
    #[serde(default = "default_notify_methods")]
    pub notify_methods: String,

    /// Bound on a single publish attempt; a slow or dead broker cannot
    /// stall the proxied request beyond this
    #[serde(with = "humantime_serde", default = "default_publish_timeout")]
    pub publish_timeout: Duration,
}

fn default_broker_connection() -> String {
    "nats://localhost:4222".to_string()
}

fn default_connection_name() -> String {
    "search-notify".to_string()
}

fn default_topic_name() -> String {
    "search".to_string()
}

fn default_true() -> bool {
    true
}

fn default_index_headers() -> String {
    "x-user x-user-id x-tenant-name x-tenant-id".to_string()
}

fn default_index_headers_prefix() -> String {
    "x-object-meta-*".to_string()
}

fn default_notify_methods() -> String {
    "PUT POST".to_string()
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(2)
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            broker_connection: default_broker_connection(),
            connection_name: default_connection_name(),
            topic_name: default_topic_name(),
            topic_kind: TopicKind::default(),
            topic_durable: default_true(),
            index_headers: default_index_headers(),
            index_headers_prefix: default_index_headers_prefix(),
            notify_methods: default_notify_methods(),
            publish_timeout: default_publish_timeout(),
        }
    }
}

impl NotifierConfig {
    /// Load configuration from defaults, an optional file, then
    /// environment variables with prefix `SEARCH_NOTIFY_`. Validates
    /// before returning.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SEARCH_NOTIFY").try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Startup validation: the interceptor must not start with an
    /// invalid policy or an unparseable broker URI.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.broker_connection).map_err(|e| ConfigError::BrokerUri {
            uri: self.broker_connection.clone(),
            reason: e.to_string(),
        })?;

        if self.topic_name.trim().is_empty() {
            return Err(ConfigError::EmptyTopicName);
        }

        self.policy()?;
        Ok(())
    }

    /// Build the immutable allow policy from the whitelist options
    pub fn policy(&self) -> Result<AllowPolicy, ConfigError> {
        AllowPolicy::from_lists(&self.index_headers, &self.index_headers_prefix)
    }

    /// Topic settings as one value
    pub fn topic(&self) -> TopicConfig {
        TopicConfig {
            name: self.topic_name.clone(),
            kind: self.topic_kind,
            durable: self.topic_durable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = NotifierConfig::default();
        config.validate().unwrap();
        assert_eq!(config.topic_name, "search");
        assert_eq!(config.topic_kind, TopicKind::Direct);
        assert!(config.topic_durable);
    }

    #[test]
    fn default_policy_covers_object_metadata() {
        let policy = NotifierConfig::default().policy().unwrap();
        assert!(policy.admits("X-User"));
        assert!(policy.admits("X-Object-Meta-Color"));
        assert!(!policy.admits("Content-Length"));
    }

    #[test]
    fn bad_broker_uri_is_fatal() {
        let config = NotifierConfig {
            broker_connection: "not a uri".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::BrokerUri { .. }
        ));
    }

    #[test]
    fn empty_topic_name_is_fatal() {
        let config = NotifierConfig {
            topic_name: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::EmptyTopicName
        ));
    }

    #[test]
    fn malformed_prefix_is_fatal() {
        let config = NotifierConfig {
            index_headers_prefix: "x-object-meta-".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::PrefixMarker(_)
        ));
    }
}
