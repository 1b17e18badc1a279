//! Nullable sleep: records requested pauses and returns immediately.

use async_trait::async_trait;
use intake_queue::Sleep;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct NullSleep {
    slept: Mutex<Vec<Duration>>,
}

impl NullSleep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to `sleep`, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleep for NullSleep {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
