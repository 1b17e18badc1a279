//! Bounded connection retry.

use std::time::Duration;

use async_trait::async_trait;

use crate::{Broker, BrokerChannel, QueueError};

/// Fixed-backoff retry bound for establishing the broker connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_secs(3),
        }
    }
}

/// Injectable sleep, so the retry loop can be driven without waiting.
#[async_trait]
pub trait Sleep: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleep on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleep;

#[async_trait]
impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Try `broker.connect()` up to `policy.attempts` times, sleeping
/// `policy.backoff` between failed attempts.
pub async fn connect_with_retry(
    broker: &dyn Broker,
    policy: &RetryPolicy,
    sleep: &dyn Sleep,
) -> Result<Box<dyn BrokerChannel>, QueueError> {
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match broker.connect().await {
            Ok(channel) => {
                if attempt > 1 {
                    tracing::info!(attempt, "broker connection established after retry");
                }
                return Ok(channel);
            }
            Err(QueueError::MissingCredentials) => return Err(QueueError::MissingCredentials),
            Err(e) => {
                tracing::info!("broker connection failed (attempt {attempt}/{attempts}): {e}");
                if attempt < attempts {
                    sleep.sleep(policy.backoff).await;
                }
            }
        }
    }
    Err(QueueError::ConnectFailed { attempts })
}
