//! Request interceptor
//!
//! The per-request hook invoked by the host proxy pipeline. Gates on the
//! HTTP method, filters the headers, builds the envelope and attempts
//! one bounded publish. The proxied request proceeds identically in
//! every case; no side-channel error is ever raised past this boundary.

use async_trait::async_trait;
use http::Method;
use search_notify_core::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Outcome of observing one request.
///
/// Terminal states of the side-channel; the host pipeline forwards the
/// request the same way regardless.
#[derive(Debug)]
pub enum NotifyOutcome {
    /// Method outside the allow-list; no publish attempted
    Skipped,
    /// Envelope delivered to the broker
    Published,
    /// Publish attempt failed; reported here and dropped
    PublishFailed(PublishError),
}

impl NotifyOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Counters across the interceptor's lifetime
#[derive(Debug, Clone, Copy)]
pub struct InterceptStats {
    pub received: u64,
    pub skipped: u64,
    pub published: u64,
    pub failed: u64,
}

/// Per-request hook orchestrating filter → envelope → publish
pub struct Interceptor<P> {
    policy: AllowPolicy,
    methods: HashSet<Method>,
    publish_timeout: Duration,
    publisher: P,
    metrics: InterceptMetrics,
    received: AtomicU64,
    skipped: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
}

impl<P: Publisher> Interceptor<P> {
    /// Create an interceptor with an explicit policy and method allow-list
    pub fn new(
        policy: AllowPolicy,
        methods: impl IntoIterator<Item = Method>,
        publish_timeout: Duration,
        publisher: P,
    ) -> Self {
        Self {
            policy,
            methods: methods.into_iter().collect(),
            publish_timeout,
            publisher,
            metrics: InterceptMetrics::new("interceptor"),
            received: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Build from the recognized configuration options
    pub fn from_config(config: &NotifierConfig, publisher: P) -> Result<Self, ConfigError> {
        let policy = config.policy()?;
        let methods = parse_methods(&config.notify_methods)?;
        Ok(Self::new(policy, methods, config.publish_timeout, publisher))
    }

    /// Get statistics
    pub fn stats(&self) -> InterceptStats {
        InterceptStats {
            received: self.received.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Access the wrapped publisher
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Observe one inbound request.
    ///
    /// Costs the proxied call at most one publish attempt bounded by the
    /// configured timeout, and never propagates an error.
    pub async fn observe(
        &self,
        method: &Method,
        path: &str,
        headers: &[(String, String)],
    ) -> NotifyOutcome {
        self.received.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_request(method.as_str());

        if !self.methods.contains(method) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            self.metrics.record_skipped(method.as_str());
            trace!(%method, path, "Method not eligible, skipping");
            return NotifyOutcome::Skipped;
        }

        let filtered = self
            .policy
            .filter(headers.iter().map(|(name, value)| (name.as_str(), value.as_str())));
        let envelope = Envelope::build(path, filtered);

        let start = Instant::now();
        let attempt =
            tokio::time::timeout(self.publish_timeout, self.publisher.publish(&envelope)).await;
        self.metrics.record_publish_latency(start.elapsed());

        let result = match attempt {
            Ok(result) => result,
            Err(_) => Err(PublishError::timeout(self.publish_timeout)),
        };

        match result {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_published();
                debug!(path, "Published search notification");
                NotifyOutcome::Published
            }
            Err(error) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_failure(error.kind());
                warn!(error = %error, path, "Search notification failed, request continues");
                NotifyOutcome::PublishFailed(error)
            }
        }
    }
}

fn parse_methods(list: &str) -> Result<HashSet<Method>, ConfigError> {
    list.split_whitespace()
        .map(|entry| {
            Method::try_from(entry.to_ascii_uppercase().as_str())
                .map_err(|_| ConfigError::Method(entry.to_string()))
        })
        .collect()
}

// ============================================================================
// Pipeline hook
// ============================================================================

/// Request metadata handed over by the host pipeline
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RequestParts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
        }
    }

    /// Builder: add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The host pipeline's request-handling contract
#[async_trait]
pub trait PipelineHandler: Send + Sync {
    type Response: Send;

    async fn handle(&self, request: RequestParts) -> Self::Response;
}

/// Wraps an inner handler with the search side-channel.
///
/// Observes every request, then delegates; the inner response is
/// returned unmodified whether the publish succeeded, failed or was
/// skipped.
pub struct Intercepted<H, P> {
    inner: H,
    interceptor: Arc<Interceptor<P>>,
}

impl<H, P> Intercepted<H, P> {
    pub fn new(inner: H, interceptor: Arc<Interceptor<P>>) -> Self {
        Self { inner, interceptor }
    }

    /// Access the interceptor, e.g. for stats
    pub fn interceptor(&self) -> &Interceptor<P> {
        &self.interceptor
    }
}

#[async_trait]
impl<H, P> PipelineHandler for Intercepted<H, P>
where
    H: PipelineHandler,
    P: Publisher + 'static,
{
    type Response = H::Response;

    async fn handle(&self, request: RequestParts) -> Self::Response {
        self.interceptor
            .observe(&request.method, &request.path, &request.headers)
            .await;
        self.inner.handle(request).await
    }
}
