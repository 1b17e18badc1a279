//! Graceful shutdown.
//!
//! SIGINT/SIGTERM (or a programmatic trigger) is broadcast to the HTTP
//! server task and the session sweeper via a `tokio::sync::broadcast`
//! channel.

use tokio::signal;
use tokio::sync::broadcast;

/// Subsystems call [`subscribe`](Self::subscribe) and `select!` on the
/// receiver next to their main loop.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM, SIGINT or a programmatic trigger, then notify every
    /// subscriber.
    pub async fn wait_for_signal(&self) {
        let mut triggered = self.subscribe();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("SIGTERM handler unavailable: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = signal::ctrl_c() => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
            _ = triggered.recv() => { tracing::info!("shutdown requested"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut sweeper = controller.subscribe();
        let mut server = controller.subscribe();
        controller.shutdown();
        assert!(sweeper.recv().await.is_ok());
        assert!(server.recv().await.is_ok());
    }

    #[tokio::test]
    async fn wait_returns_on_programmatic_trigger() {
        let controller = std::sync::Arc::new(ShutdownController::new());
        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.wait_for_signal().await })
        };
        // The waiter subscribes when first polled; keep triggering until it returns.
        for _ in 0..500 {
            if waiter.is_finished() {
                break;
            }
            controller.shutdown();
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(waiter.is_finished());
        waiter.await.unwrap();
    }
}
