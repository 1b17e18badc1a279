use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] intake_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] intake_store_lmdb::LmdbError),

    #[error("queue error: {0}")]
    Queue(#[from] intake_queue::QueueError),

    #[error("form workflow error: {0}")]
    Form(#[from] intake_forms::FormError),

    #[error("RPC server error: {0}")]
    Rpc(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
