//! Clinical intake service assembly.
//!
//! The node wires the pieces together and owns their lifecycle:
//! - Opens the LMDB environment (committed forms, identity registry)
//! - Builds the in-process session store and its expiry sweeper
//! - Connects the queue producer, retrying with a fixed backoff
//! - Builds the verification machine and the form workflow
//! - Serves HTTP until SIGINT/SIGTERM, then closes the producer

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::{NodeConfig, QueueConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::IntakeNode;
pub use shutdown::ShutdownController;
