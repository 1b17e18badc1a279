//! Clinical intake daemon.

use anyhow::Context;
use clap::Parser;
use intake_node::{init_logging, IntakeNode, LogFormat, NodeConfig};
use intake_store_lmdb::LmdbEnvironment;
use intake_types::IdentityRecord;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake-daemon", about = "Clinical intake backend daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// LMDB directory for committed forms and the identity registry.
    #[arg(long, env = "INTAKE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory uploaded attachments are written to.
    #[arg(long, env = "INTAKE_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// HTTP port.
    #[arg(long, env = "INTAKE_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "INTAKE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "INTAKE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Message broker user.
    #[arg(long, env = "RABBITMQ_DEFAULT_USER", hide_env_values = true)]
    broker_user: Option<String>,

    /// Message broker password.
    #[arg(long, env = "RABBITMQ_DEFAULT_PASS", hide_env_values = true)]
    broker_pass: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the service.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Manage the doctor identity registry.
    #[command(name = "identity")]
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run until SIGINT/SIGTERM.
    Run,
}

#[derive(clap::Subcommand)]
enum IdentityAction {
    /// Load identity records from a JSON array export.
    Import {
        /// File containing `[{"id", "first_name", "last_name", "dob"}, ...]`.
        file: PathBuf,
    },
}

impl Cli {
    /// Layer flags and env vars over the file config (or defaults).
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.upload_dir = dir.clone();
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(user) = &self.broker_user {
            config.queue.username = user.clone();
        }
        if let Some(pass) = &self.broker_pass {
            config.queue.password = pass.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Node {
            action: NodeAction::Run,
        } => {
            tracing::info!(
                "starting intake service (HTTP {}:{}, broker {}:{}, queue {})",
                config.rpc_bind,
                config.rpc_port,
                config.queue.host,
                config.queue.port,
                config.queue.queue_name,
            );

            let mut node = IntakeNode::new(config).await?;
            node.start().await?;

            tracing::info!("shutdown signal received, stopping service");
            node.stop().await?;
            tracing::info!("intake daemon exited cleanly");
        }
        Command::Identity {
            action: IdentityAction::Import { file },
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let records: Vec<IdentityRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing identity records in {}", file.display()))?;

            let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;
            let imported = env.identity_store().import(&records)?;
            env.sync()?;
            tracing::info!(
                imported,
                data_dir = %config.data_dir.display(),
                "identity records imported"
            );
        }
    }

    Ok(())
}
