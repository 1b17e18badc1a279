use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("broker credentials are not configured")]
    MissingCredentials,

    #[error("broker connection error: {0}")]
    Connect(String),

    #[error("failed to connect to broker after {attempts} attempts")]
    ConnectFailed { attempts: u32 },

    #[error("queue declaration failed: {0}")]
    Declare(String),

    #[error("message serialization failed: {0}")]
    Serialization(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("producer is closed")]
    Closed,
}
