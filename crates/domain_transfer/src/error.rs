//! Transfer domain errors

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use core_kernel::{PortError, ProductId};
use domain_mandate::MandateError;
use infra_rpc::TransportError;

use crate::orchestrator::SyncStep;

/// Errors raised by the entity sync services
///
/// Remote application errors are not represented here; they are returned as
/// data inside the response.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A prerequisite is missing, typically a remote id
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The local entity failed its own validity rules
    #[error(transparent)]
    Validation(#[from] MandateError),

    /// A built payload does not satisfy the platform's schema
    #[error("Payload for {method} violates its schema: {}", .violations.join("; "))]
    Schema {
        method: String,
        violations: Vec<String>,
    },

    /// A success response does not have the expected shape
    #[error("Malformed response for {method}: {message}")]
    MalformedResponse {
        method: String,
        message: String,
    },

    /// Local data drifted into a state that cannot be synchronized
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// The document could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl SyncError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SyncError::InvalidArgument(message.into())
    }

    pub fn malformed_response(method: &str, message: impl Into<String>) -> Self {
        SyncError::MalformedResponse {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

/// Aggregate failure of a stock transfer run
///
/// Carries exactly the run's bookkeeping: the error messages, the steps that
/// were skipped and those that were executed, and when the run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub struct TransferFailure {
    pub errors: BTreeMap<ProductId, Vec<String>>,
    pub skipped: BTreeMap<ProductId, Vec<SyncStep>>,
    pub actions: BTreeMap<ProductId, Vec<SyncStep>>,
    pub timestamp: DateTime<Utc>,
}

impl TransferFailure {
    /// All error messages, in the order they were recorded
    pub fn messages(&self) -> Vec<&str> {
        self.errors
            .values()
            .flat_map(|messages| messages.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stock transfer failed: {}", self.messages().join("; "))
    }
}
