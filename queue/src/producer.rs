//! The process-wide queue producer.

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{connect_with_retry, Broker, BrokerChannel, QueueError, RetryPolicy, Sleep};

/// Durable publisher for committed forms.
///
/// Constructed once at startup and shared by handle. Publishes are
/// serialized through a mutex because the underlying channel is not safe
/// for concurrent use. After [`close`](Self::close) every publish fails with
/// [`QueueError::Closed`].
pub struct QueueProducer {
    queue_name: String,
    channel: Mutex<Option<Box<dyn BrokerChannel>>>,
}

impl QueueProducer {
    /// Connect (with bounded retry) and declare the durable queue.
    ///
    /// Exhausting the retry bound is fatal for the caller: the process has
    /// no way to hand forms to the summary worker without a producer.
    pub async fn connect(
        broker: &dyn Broker,
        queue_name: impl Into<String>,
        policy: &RetryPolicy,
        sleep: &dyn Sleep,
    ) -> Result<Self, QueueError> {
        let queue_name = queue_name.into();
        let channel = connect_with_retry(broker, policy, sleep).await?;
        channel.declare_durable_queue(&queue_name).await?;
        tracing::info!(queue = %queue_name, "queue producer ready");
        Ok(Self {
            queue_name,
            channel: Mutex::new(Some(channel)),
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Serialize `message` as JSON and publish it persistently.
    pub async fn publish<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), QueueError> {
        let body = serde_json::to_vec(message).map_err(|e| {
            tracing::error!("queue message serialization error: {e}");
            QueueError::Serialization(e.to_string())
        })?;

        let guard = self.channel.lock().await;
        let channel = guard.as_ref().ok_or(QueueError::Closed)?;
        channel
            .publish_persistent(&self.queue_name, &body)
            .await
            .map_err(|e| {
                tracing::error!(queue = %self.queue_name, "publish error: {e}");
                e
            })?;
        tracing::info!(queue = %self.queue_name, bytes = body.len(), "form data published");
        Ok(())
    }

    /// Best-effort shutdown. Failures are logged, never returned.
    pub async fn close(&self) {
        let channel = self.channel.lock().await.take();
        match channel {
            Some(channel) => match channel.close().await {
                Ok(()) => tracing::info!(queue = %self.queue_name, "queue producer closed"),
                Err(e) => tracing::warn!("error closing broker connection: {e}"),
            },
            None => tracing::debug!("queue producer already closed"),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.channel.lock().await.is_none()
    }
}
