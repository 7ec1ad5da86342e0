//! # Search Notify Core
//!
//! Core types and policy for the object-storage search notifier: the
//! side-channel that watches write requests going through a storage proxy
//! and publishes their indexable metadata to a message broker for a
//! downstream search indexer.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ AllowPolicy │────►│  Envelope   │────►│  Publisher  │────► broker topic
//! │ (filter)    │     │ (build)     │     │ (deliver)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! This crate is pure and broker-agnostic: the [`Publisher`](sink::Publisher)
//! trait is the seam to the transport crate.

pub mod config;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod sink;
pub mod topic;

pub use config::*;
pub use envelope::*;
pub use error::*;
pub use metrics::*;
pub use policy::*;
pub use sink::*;
pub use topic::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::NotifierConfig;
    pub use crate::envelope::{decode_id, encode_id, Envelope};
    pub use crate::error::{ConfigError, PublishError, Result};
    pub use crate::metrics::{InterceptMetrics, PublisherMetrics};
    pub use crate::policy::{AllowPolicy, FilteredHeaders};
    pub use crate::sink::Publisher;
    pub use crate::topic::{TopicConfig, TopicKind};
}
