//! Event domain errors

use thiserror::Error;

use core_kernel::PortError;
use domain_transfer::SyncError;
use infra_rpc::TransportError;

/// Errors raised by the event pull
///
/// Every variant stops the caller's pull loop. None of them leaves an audit
/// entry behind, so a retry starts again from the same cursor.
#[derive(Debug, Error)]
pub enum EventSyncError {
    /// The pull was requested with unusable arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform handed out an event at or before the cursor
    #[error("Non-monotonic event stream: received event {received} after cursor {cursor}")]
    NonMonotonic { cursor: i64, received: i64 },

    /// The pull result does not have the expected shape
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The platform answered the pull with an application error
    #[error("Event pull rejected by the platform: {0}")]
    Remote(String),

    /// The pull yielded no response
    #[error("transport fault: no response for {method}")]
    TransportFault { method: String },

    /// A listener failed while processing an event
    #[error("Listener {listener} failed on event {event_id}: {message}")]
    Listener {
        listener: String,
        event_id: i64,
        message: String,
    },

    #[error(transparent)]
    Port(#[from] PortError),
}

impl EventSyncError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EventSyncError::InvalidArgument(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        EventSyncError::MalformedEvent(message.into())
    }
}

impl From<TransportError> for EventSyncError {
    fn from(error: TransportError) -> Self {
        EventSyncError::InvalidArgument(error.to_string())
    }
}

impl From<SyncError> for EventSyncError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::Port(error) => EventSyncError::Port(error),
            other => EventSyncError::InvalidArgument(other.to_string()),
        }
    }
}

/// Failure of a single listener
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<PortError> for ListenerError {
    fn from(error: PortError) -> Self {
        Self::new(error.to_string())
    }
}
