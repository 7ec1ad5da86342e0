//! # Search Notify
//!
//! Side-channel notifier for an object-storage proxy: intercepts write
//! requests, filters their headers against an allow policy, and publishes
//! a search-index envelope to a NATS JetStream topic.
//!
//! ```text
//! inbound request ──► Interceptor ──► filter ──► envelope ──► NatsPublisher ──► topic
//!        │                                      (one bounded attempt, fire-and-forget)
//!        └──────────────► inner handler (always invoked, response unchanged)
//! ```
//!
//! The proxied request is forwarded whether the publish succeeded,
//! failed or was skipped; no side-channel error ever reaches the
//! original caller.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = NotifierConfig::load(None)?;
//! let publisher = NatsPublisher::new(NatsPublisherConfig::from_notifier(&config));
//! let interceptor = Arc::new(Interceptor::from_config(&config, publisher)?);
//!
//! let handler = Intercepted::new(inner_handler, interceptor);
//! ```

pub mod interceptor;
pub mod publisher;

pub use interceptor::*;
pub use publisher::*;
