//! Broker seam.

use async_trait::async_trait;

use crate::QueueError;

/// Something that can open a publishing channel to a message broker.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BrokerChannel>, QueueError>;
}

/// An open connection + channel. Not assumed safe for concurrent use;
/// [`crate::QueueProducer`] serializes every call.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declare a durable queue. Redeclaring an existing queue is a no-op.
    async fn declare_durable_queue(&self, queue: &str) -> Result<(), QueueError>;

    /// Publish `payload` to `queue`, asking the broker to persist it.
    async fn publish_persistent(&self, queue: &str, payload: &[u8]) -> Result<(), QueueError>;

    async fn close(&self) -> Result<(), QueueError>;
}
