//! Durable message-queue producer.
//!
//! One [`QueueProducer`] exists per process. It is built once at startup
//! (connecting with bounded retry), handed to the form workflow as a shared
//! handle, and closed at shutdown. Publishing goes through the [`Broker`] /
//! [`BrokerChannel`] seam so tests run without a broker; [`AmqpBroker`] is the
//! production adapter.

pub mod amqp;
pub mod broker;
pub mod error;
pub mod producer;
pub mod retry;

pub use amqp::{AmqpBroker, AmqpSettings};
pub use broker::{Broker, BrokerChannel};
pub use error::QueueError;
pub use producer::QueueProducer;
pub use retry::{connect_with_retry, RetryPolicy, Sleep, TokioSleep};

/// Queue the summary worker consumes from.
pub const DEFAULT_QUEUE_NAME: &str = "rag_tasks";
