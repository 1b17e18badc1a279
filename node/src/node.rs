//! Service assembly and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use intake_forms::{FormWorkflow, UploadRoot};
use intake_queue::{AmqpBroker, Broker, QueueProducer, Sleep, TokioSleep};
use intake_rpc::{RpcMetrics, RpcServer, RpcState};
use intake_session::MemorySessionStore;
use intake_store_lmdb::{LmdbEnvironment, LmdbIdentityStore};
use intake_verification::{TokenSigner, TokenValidator, VerificationMachine};
use tokio::task::JoinHandle;

use crate::{NodeConfig, NodeError, ShutdownController};

/// The running service: stores, workflows, producer and HTTP server.
pub struct IntakeNode {
    config: NodeConfig,
    env: LmdbEnvironment,
    sessions: Arc<MemorySessionStore>,
    producer: Arc<QueueProducer>,
    rpc_state: Arc<RpcState>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
    stopped: bool,
}

impl IntakeNode {
    /// Build the service against the configured AMQP broker.
    ///
    /// Fails when the broker stays unreachable for every retry attempt.
    pub async fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let broker = AmqpBroker::new(config.queue.amqp_settings());
        Self::with_broker(config, &broker, &TokioSleep).await
    }

    /// Build the service against any [`Broker`].
    pub async fn with_broker(
        config: NodeConfig,
        broker: &dyn Broker,
        sleep: &dyn Sleep,
    ) -> Result<Self, NodeError> {
        config.validate()?;

        let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;
        let forms = Arc::new(env.form_store());
        let identities = Arc::new(env.identity_store());
        let sessions = Arc::new(MemorySessionStore::new());
        let uploads = UploadRoot::open(&config.upload_dir)?;
        tracing::info!(dir = %uploads.display(), "attachment root ready");

        let producer = Arc::new(
            QueueProducer::connect(
                broker,
                config.queue.queue_name.clone(),
                &config.queue.retry_policy(),
                sleep,
            )
            .await?,
        );

        let mut validator =
            TokenValidator::new(sessions.clone()).with_strict_step_order(config.strict_step_order);
        if let Some(secret) = &config.token_secret {
            let signer = TokenSigner::new(secret)
                .map_err(|e| NodeError::Config(format!("token_secret: {e}")))?;
            validator = validator.with_signer(signer);
            tracing::info!("step tokens are signed");
        }
        let tokens = Arc::new(validator);

        let verification = VerificationMachine::new(sessions.clone(), identities, tokens.clone())
            .with_step_ttl(config.step_ttl());
        let workflow = FormWorkflow::new(sessions.clone(), forms, tokens, uploads, producer.clone())
            .with_draft_ttl(config.draft_ttl());
        let metrics = RpcMetrics::new().map_err(|e| NodeError::Rpc(e.to_string()))?;
        let rpc_state = Arc::new(RpcState::new(
            Arc::new(verification),
            Arc::new(workflow),
            Arc::new(metrics),
        ));

        Ok(Self {
            config,
            env,
            sessions,
            producer,
            rpc_state,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
            local_addr: None,
            stopped: false,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The HTTP routes, for serving elsewhere or for in-process requests.
    pub fn router(&self) -> Router {
        intake_rpc::server::router(self.rpc_state.clone())
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// The identity registry backing verification.
    pub fn identity_store(&self) -> LmdbIdentityStore {
        self.env.identity_store()
    }

    /// The address the HTTP server is bound to, once services are spawned.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Start the HTTP server and the session sweeper, then wait for a
    /// shutdown signal.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        self.spawn_services().await?;
        tracing::info!(
            "intake service started (HTTP {}:{})",
            self.config.rpc_bind,
            self.config.rpc_port
        );
        self.shutdown.wait_for_signal().await;
        Ok(())
    }

    /// Bind the HTTP listener and spawn background tasks without waiting.
    /// Each task ends on shutdown; the HTTP task only after in-flight
    /// requests have finished.
    pub async fn spawn_services(&mut self) -> Result<(), NodeError> {
        // ── HTTP server ─────────────────────────────────────────────────
        let server = RpcServer::with_state(
            self.config.rpc_bind.clone(),
            self.config.rpc_port,
            self.rpc_state.clone(),
        );
        let listener = server
            .bind()
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))?;
        self.local_addr = Some(listener.local_addr()?);
        let mut shutdown_rx = self.shutdown.subscribe();
        self.task_handles.push(tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("HTTP server draining");
            };
            match server.serve(listener, signal).await {
                Ok(()) => tracing::info!("HTTP server stopped"),
                Err(e) => tracing::error!("HTTP server error: {e}"),
            }
        }));

        // ── Session expiry sweeper ──────────────────────────────────────
        let sessions = self.sessions.clone();
        let every = self.config.session_sweep_interval();
        let mut shutdown_rx = self.shutdown.subscribe();
        self.task_handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = sessions.purge_expired() {
                            tracing::warn!("session sweep failed: {e}");
                        }
                    }
                }
            }
            tracing::debug!("session sweeper stopped");
        }));
        Ok(())
    }

    /// Stop background tasks and close the producer. Safe to call twice.
    ///
    /// The producer is closed only after the HTTP server has drained, so a
    /// commit accepted before shutdown still publishes.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("background task ended abnormally: {e}");
            }
        }
        self.producer.close().await;
        if let Err(e) = self.env.sync() {
            tracing::warn!("LMDB sync on shutdown failed: {e}");
        }
        tracing::info!("intake service stopped");
        Ok(())
    }
}
