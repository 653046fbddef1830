//! Worker error handling

use thiserror::Error;

use domain_transfer::SyncError;
use infra_db::DatabaseError;
use infra_rpc::TransportError;

/// Errors raised while assembling the worker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The shipped payload schemas failed to compile
    #[error("Schema error: {0}")]
    Schema(#[from] SyncError),
}
