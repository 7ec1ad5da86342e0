//! NATS JetStream publisher
//!
//! Owns the broker connection for the side-channel. The connection is
//! established lazily on first use and reused across publishes; a call
//! that finds it stale re-dials instead of failing permanently. A failed
//! attempt is reported once to the caller; there is no retry loop.

use async_nats::jetstream::{self, stream::RetentionPolicy, stream::StorageType, Context};
use async_trait::async_trait;
use search_notify_core::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

/// Connection settings for [`NatsPublisher`]
#[derive(Debug, Clone)]
pub struct NatsPublisherConfig {
    /// Broker connection URI
    pub url: String,
    /// Connection label, visible in broker-side monitoring
    pub connection_name: String,
    /// Topic binding, fixed at configuration time
    pub topic: TopicConfig,
}

impl NatsPublisherConfig {
    /// Extract the publisher settings from the notifier configuration
    pub fn from_notifier(config: &NotifierConfig) -> Self {
        Self {
            url: config.broker_connection.clone(),
            connection_name: config.connection_name.clone(),
            topic: config.topic(),
        }
    }
}

impl Default for NatsPublisherConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            connection_name: "search-notify".to_string(),
            topic: TopicConfig::default(),
        }
    }
}

/// JetStream-backed [`Publisher`]
pub struct NatsPublisher {
    config: NatsPublisherConfig,
    client: RwLock<Option<async_nats::Client>>,
    jetstream: RwLock<Option<Context>>,
    metrics: PublisherMetrics,
    published: AtomicU64,
}

impl NatsPublisher {
    /// Create a new publisher; the connection is opened on first publish
    pub fn new(config: NatsPublisherConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            jetstream: RwLock::new(None),
            metrics: PublisherMetrics::new("nats_publisher"),
            published: AtomicU64::new(0),
        }
    }

    /// Get published count
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Channel acquisition: reuse the live context or (re)connect
    async fn acquire(&self) -> Result<Context> {
        {
            let client = self.client.read().await;
            let js = self.jetstream.read().await;
            if let (Some(client), Some(js)) = (client.as_ref(), js.as_ref()) {
                if client.connection_state() == async_nats::connection::State::Connected {
                    return Ok(js.clone());
                }
            }
        }
        self.reconnect().await
    }

    async fn reconnect(&self) -> Result<Context> {
        let mut client_slot = self.client.write().await;
        let mut js_slot = self.jetstream.write().await;

        // Another caller may have re-dialed while we waited on the lock.
        if let (Some(client), Some(js)) = (client_slot.as_ref(), js_slot.as_ref()) {
            if client.connection_state() == async_nats::connection::State::Connected {
                return Ok(js.clone());
            }
        }

        info!(url = %self.config.url, "Connecting to broker");
        let client = async_nats::ConnectOptions::new()
            .name(&self.config.connection_name)
            .connect(&self.config.url)
            .await
            .map_err(|e| PublishError::connection_with_source("failed to connect", e))?;

        let js = jetstream::new(client.clone());
        self.ensure_stream(&js).await?;

        if client_slot.is_some() {
            self.metrics.record_reconnect();
        }
        *client_slot = Some(client);
        *js_slot = Some(js.clone());
        Ok(js)
    }

    /// Declare the topic binding: get the stream or create it with the
    /// configured kind and durability
    async fn ensure_stream(&self, js: &Context) -> Result<()> {
        let topic = &self.config.topic;

        match js.get_stream(&topic.name).await {
            Ok(_) => {
                debug!(stream = %topic.name, "Stream exists");
                Ok(())
            }
            Err(_) => {
                let config = jetstream::stream::Config {
                    name: topic.name.clone(),
                    subjects: topic.bind_subjects(),
                    retention: match topic.kind {
                        TopicKind::Direct => RetentionPolicy::WorkQueue,
                        TopicKind::Fanout | TopicKind::Topic => RetentionPolicy::Limits,
                    },
                    storage: if topic.durable {
                        StorageType::File
                    } else {
                        StorageType::Memory
                    },
                    ..Default::default()
                };

                js.create_stream(config).await.map_err(|e| {
                    PublishError::connection_with_source(
                        format!("failed to create stream `{}`", topic.name),
                        e,
                    )
                })?;

                info!(
                    stream = %topic.name,
                    kind = %topic.kind,
                    durable = topic.durable,
                    "Created stream"
                );
                Ok(())
            }
        }
    }

    /// Drop the cached connection so the next call re-dials
    async fn invalidate(&self) {
        *self.jetstream.write().await = None;
        *self.client.write().await = None;
        debug!("Invalidated broker connection");
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, envelope: &Envelope) -> Result<()> {
        let js = self.acquire().await?;

        let subject = self.config.topic.subject_for(&envelope.path);
        let payload = envelope
            .to_bytes()
            .map_err(|e| PublishError::encoding_with_source("failed to serialize envelope", e))?;

        let delivery = async {
            let ack = js
                .publish(subject.clone(), payload)
                .await
                .map_err(|e| PublishError::connection_with_source("publish failed", e))?;
            ack.await
                .map_err(|e| PublishError::connection_with_source("ack failed", e))?;
            Ok(())
        }
        .await;

        match delivery {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_message();
                trace!(subject, path = %envelope.path, "Published envelope");
                Ok(())
            }
            Err(error) => {
                self.invalidate().await;
                Err(error)
            }
        }
    }
}

// ============================================================================
// In-memory publishers (for testing)
// ============================================================================

/// Records every envelope instead of touching a broker
#[derive(Default)]
pub struct RecordingPublisher {
    messages: RwLock<Vec<Envelope>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published envelopes
    pub async fn messages(&self) -> Vec<Envelope> {
        self.messages.read().await.clone()
    }

    /// Number of published envelopes
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Clear recorded envelopes
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, envelope: &Envelope) -> Result<()> {
        self.messages.write().await.push(envelope.clone());
        Ok(())
    }
}

/// Fails every publish with a connection failure, simulating a dead broker
pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _envelope: &Envelope) -> Result<()> {
        Err(PublishError::connection("broker unreachable"))
    }
}

/// Delays every publish, for exercising the attempt timeout
pub struct SlowPublisher {
    pub delay: Duration,
}

#[async_trait]
impl Publisher for SlowPublisher {
    async fn publish(&self, _envelope: &Envelope) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_notify_core::FilteredHeaders;

    #[tokio::test]
    async fn recording_publisher_captures_envelopes() {
        let publisher = RecordingPublisher::new();
        let envelope = Envelope::build("/v1/a/c/o", FilteredHeaders::new());

        publisher.publish(&envelope).await.unwrap();

        let messages = publisher.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].path, "/v1/a/c/o");
    }

    #[tokio::test]
    async fn failing_publisher_reports_connection_failure() {
        let envelope = Envelope::build("/v1/a/c/o", FilteredHeaders::new());
        let error = FailingPublisher.publish(&envelope).await.unwrap_err();
        assert!(matches!(error, PublishError::ConnectionFailure { .. }));
    }
}
