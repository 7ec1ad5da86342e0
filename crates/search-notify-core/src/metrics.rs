//! Metrics for the search notifier
//!
//! Prometheus-compatible recorders over the `metrics` facade.

use metrics::{counter, histogram};
use std::time::Duration;

/// Metric names as constants for consistency
pub mod names {
    pub const NOTIFY_REQUESTS_TOTAL: &str = "search_notify_requests_total";
    pub const NOTIFY_SKIPPED_TOTAL: &str = "search_notify_skipped_total";
    pub const NOTIFY_PUBLISHED_TOTAL: &str = "search_notify_published_total";
    pub const NOTIFY_FAILURES_TOTAL: &str = "search_notify_failures_total";
    pub const NOTIFY_PUBLISH_LATENCY: &str = "search_notify_publish_latency_seconds";

    pub const PUBLISHER_MESSAGES_TOTAL: &str = "search_notify_publisher_messages_total";
    pub const PUBLISHER_RECONNECTS_TOTAL: &str = "search_notify_publisher_reconnects_total";
}

/// Labels for metrics
pub mod labels {
    pub const COMPONENT: &str = "component";
    pub const METHOD: &str = "method";
    pub const ERROR_TYPE: &str = "error_type";
}

/// Interceptor-side recorders
#[derive(Clone)]
pub struct InterceptMetrics {
    component: String,
}

impl InterceptMetrics {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Record an observed request
    pub fn record_request(&self, method: &str) {
        counter!(
            names::NOTIFY_REQUESTS_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::METHOD => method.to_string(),
        )
        .increment(1);
    }

    /// Record a request skipped by the method gate
    pub fn record_skipped(&self, method: &str) {
        counter!(
            names::NOTIFY_SKIPPED_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::METHOD => method.to_string(),
        )
        .increment(1);
    }

    /// Record a delivered envelope
    pub fn record_published(&self) {
        counter!(
            names::NOTIFY_PUBLISHED_TOTAL,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(1);
    }

    /// Record a failed publish attempt
    pub fn record_failure(&self, error_type: &str) {
        counter!(
            names::NOTIFY_FAILURES_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::ERROR_TYPE => error_type.to_string(),
        )
        .increment(1);
    }

    /// Record the latency of one publish attempt
    pub fn record_publish_latency(&self, duration: Duration) {
        histogram!(
            names::NOTIFY_PUBLISH_LATENCY,
            labels::COMPONENT => self.component.clone(),
        )
        .record(duration.as_secs_f64());
    }
}

/// Publisher-side recorders
#[derive(Clone)]
pub struct PublisherMetrics {
    component: String,
}

impl PublisherMetrics {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Record a message written to the broker
    pub fn record_message(&self) {
        counter!(
            names::PUBLISHER_MESSAGES_TOTAL,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(1);
    }

    /// Record a re-established broker connection
    pub fn record_reconnect(&self) {
        counter!(
            names::PUBLISHER_RECONNECTS_TOTAL,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(1);
    }
}
