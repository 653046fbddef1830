//! Transport errors

use thiserror::Error;

/// Errors raised by the transport
///
/// These are programmer or setup errors and are never retried. Faults on the
/// wire are not represented here; see [`RpcTransport::call`](crate::RpcTransport::call).
#[derive(Debug, Error)]
pub enum TransportError {
    /// A call argument is missing or has the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The client could not be constructed from its configuration
    #[error("Invalid transport configuration: {0}")]
    Configuration(String),
}

impl TransportError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TransportError::InvalidArgument(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        TransportError::Configuration(message.into())
    }
}
