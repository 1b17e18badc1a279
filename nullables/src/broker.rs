//! Nullable broker: records published messages instead of sending them.

use async_trait::async_trait;
use intake_queue::{Broker, BrokerChannel, QueueError};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// A message as the broker would have received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    pub queue: String,
    pub payload: Vec<u8>,
    pub persistent: bool,
}

struct Shared {
    published: Mutex<Vec<PublishedMessage>>,
    declared: Mutex<Vec<String>>,
    connect_calls: AtomicU32,
    fail_connects: AtomicU32,
    fail_publish: AtomicBool,
    fail_close: AtomicBool,
    closed: AtomicBool,
    publish_attempts: AtomicU32,
    /// While `true`, publishes wait before recording.
    hold: watch::Sender<bool>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            published: Mutex::default(),
            declared: Mutex::default(),
            connect_calls: AtomicU32::new(0),
            fail_connects: AtomicU32::new(0),
            fail_publish: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            publish_attempts: AtomicU32::new(0),
            hold: watch::channel(false).0,
        }
    }
}

/// A test broker. Clones share state, so a test can keep one handle for
/// assertions while the producer owns the channel.
#[derive(Clone, Default)]
pub struct NullBroker {
    shared: Arc<Shared>,
}

impl NullBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connection attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.shared.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Make every publish fail until reset.
    pub fn fail_publishes(&self, fail: bool) {
        self.shared.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Park every publish until [`release_publishes`](Self::release_publishes).
    pub fn hold_publishes(&self) {
        self.shared.hold.send_replace(true);
    }

    pub fn release_publishes(&self) {
        self.shared.hold.send_replace(false);
    }

    /// Publishes started, including ones still held or failed.
    pub fn publish_attempts(&self) -> u32 {
        self.shared.publish_attempts.load(Ordering::SeqCst)
    }

    pub fn fail_close(&self, fail: bool) {
        self.shared.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> u32 {
        self.shared.connect_calls.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.shared.published.lock().unwrap().clone()
    }

    pub fn declared_queues(&self) -> Vec<String> {
        self.shared.declared.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Broker for NullBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerChannel>, QueueError> {
        self.shared.connect_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.shared.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.shared
                .fail_connects
                .store(remaining - 1, Ordering::SeqCst);
            return Err(QueueError::Connect("connection refused".into()));
        }
        Ok(Box::new(NullChannel {
            shared: self.shared.clone(),
        }))
    }
}

struct NullChannel {
    shared: Arc<Shared>,
}

#[async_trait]
impl BrokerChannel for NullChannel {
    async fn declare_durable_queue(&self, queue: &str) -> Result<(), QueueError> {
        let mut declared = self.shared.declared.lock().unwrap();
        if !declared.iter().any(|q| q == queue) {
            declared.push(queue.to_string());
        }
        Ok(())
    }

    async fn publish_persistent(&self, queue: &str, payload: &[u8]) -> Result<(), QueueError> {
        self.shared.publish_attempts.fetch_add(1, Ordering::SeqCst);
        let mut hold = self.shared.hold.subscribe();
        if hold.wait_for(|held| !*held).await.is_err() {
            return Err(QueueError::Publish("broker dropped".into()));
        }
        if self.shared.fail_publish.load(Ordering::SeqCst) {
            return Err(QueueError::Publish("channel closed by broker".into()));
        }
        self.shared.published.lock().unwrap().push(PublishedMessage {
            queue: queue.to_string(),
            payload: payload.to_vec(),
            persistent: true,
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        if self.shared.fail_close.load(Ordering::SeqCst) {
            return Err(QueueError::Publish("connection already reset".into()));
        }
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
