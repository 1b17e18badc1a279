//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use intake_queue::{AmqpSettings, RetryPolicy, DEFAULT_QUEUE_NAME};

use crate::NodeError;

/// Configuration for the intake service.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// LMDB directory for committed forms and the identity registry.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory attachments are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Lifetime of Step entries. Absent means they never expire.
    #[serde(default)]
    pub step_ttl_secs: Option<u64>,

    /// Lifetime of Draft entries. Absent means they never expire.
    #[serde(default)]
    pub draft_ttl_secs: Option<u64>,

    /// How often expired session entries are purged.
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,

    /// HMAC key for signing step tokens. Absent means bearer tokens.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Require each gated call to present the step it is gated on.
    #[serde(default)]
    pub strict_step_order: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default)]
    pub queue: QueueConfig,
}

/// Message broker connection and retry settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_host")]
    pub host: String,

    #[serde(default = "default_queue_port")]
    pub port: u16,

    #[serde(default = "default_queue_vhost")]
    pub vhost: String,

    /// Usually supplied through `RABBITMQ_DEFAULT_USER`.
    #[serde(default)]
    pub username: String,

    /// Usually supplied through `RABBITMQ_DEFAULT_PASS`.
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_connect_backoff_secs")]
    pub connect_backoff_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./intake_data")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploaded_files")
}

fn default_rpc_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_rpc_port() -> u16 {
    8000
}

fn default_session_sweep_secs() -> u64 {
    60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lmdb_map_size() -> usize {
    1024 * 1024 * 1024
}

fn default_queue_host() -> String {
    "rabbitmq".to_string()
}

fn default_queue_port() -> u16 {
    5672
}

fn default_queue_vhost() -> String {
    "/".to_string()
}

fn default_queue_name() -> String {
    DEFAULT_QUEUE_NAME.to_string()
}

fn default_connect_attempts() -> u32 {
    10
}

fn default_connect_backoff_secs() -> u64 {
    3
}

/// Longest accepted Step or Draft entry lifetime: one year.
pub const MAX_TTL_SECS: u64 = 365 * 24 * 3600;

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.queue.username.is_empty() || self.queue.password.is_empty() {
            return Err(NodeError::Config(
                "broker credentials not set (RABBITMQ_DEFAULT_USER / RABBITMQ_DEFAULT_PASS)".into(),
            ));
        }
        if self.queue.queue_name.is_empty() {
            return Err(NodeError::Config("queue_name must not be empty".into()));
        }
        if self.queue.connect_attempts == 0 {
            return Err(NodeError::Config("connect_attempts must be at least 1".into()));
        }
        if self.session_sweep_secs == 0 {
            return Err(NodeError::Config("session_sweep_secs must be at least 1".into()));
        }
        for (name, ttl) in [
            ("step_ttl_secs", self.step_ttl_secs),
            ("draft_ttl_secs", self.draft_ttl_secs),
        ] {
            if matches!(ttl, Some(secs) if secs == 0 || secs > MAX_TTL_SECS) {
                return Err(NodeError::Config(format!(
                    "{name} must be between 1 and {MAX_TTL_SECS}"
                )));
            }
        }
        if matches!(&self.token_secret, Some(s) if s.is_empty()) {
            return Err(NodeError::Config("token_secret must not be empty when set".into()));
        }
        Ok(())
    }

    pub fn step_ttl(&self) -> Option<Duration> {
        self.step_ttl_secs.map(Duration::from_secs)
    }

    pub fn draft_ttl(&self) -> Option<Duration> {
        self.draft_ttl_secs.map(Duration::from_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }
}

impl QueueConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.connect_attempts,
            backoff: Duration::from_secs(self.connect_backoff_secs),
        }
    }

    pub fn amqp_settings(&self) -> AmqpSettings {
        AmqpSettings {
            host: self.host.clone(),
            port: self.port,
            vhost: self.vhost.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            upload_dir: default_upload_dir(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            step_ttl_secs: None,
            draft_ttl_secs: None,
            session_sweep_secs: default_session_sweep_secs(),
            token_secret: None,
            strict_step_order: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            lmdb_map_size: default_lmdb_map_size(),
            queue: QueueConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            host: default_queue_host(),
            port: default_queue_port(),
            vhost: default_queue_vhost(),
            username: String::new(),
            password: String::new(),
            queue_name: default_queue_name(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_secs: default_connect_backoff_secs(),
        }
    }
}
