//! Publisher contract
//!
//! The seam between the pure core and the broker transport. One call is
//! one self-contained publish attempt: acquire the channel, declare the
//! topic if needed, write the message, release the channel.

use crate::envelope::Envelope;
use crate::error::Result;
use async_trait::async_trait;

/// Delivery channel to the broker.
///
/// Implementations must be safe to invoke concurrently from many
/// interceptor invocations, may lazily open and pool their connection,
/// and must tolerate a stale connection by re-establishing it rather
/// than failing permanently. Delivery is at-most-once: a failed attempt
/// is reported to the caller, never silently retried.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one envelope under the configured topic binding
    async fn publish(&self, envelope: &Envelope) -> Result<()>;
}
