//! Ports and Adapters Infrastructure
//!
//! Foundational types shared by every port in the workspace, plus the two
//! operational collaborators the integration layer talks to:
//!
//! - [`ErrorReporter`]: error tracking / monitoring. Receives transport faults
//!   and data-consistency anomalies.
//! - [`Notifier`]: operational notifications (mail in production) for the
//!   back-office team.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Sync services / orchestrator / event pull  │
//! └──────────────────────────────────────────────┘
//!            │                │              │
//!            ▼                ▼              ▼
//!      Entity ports      RpcTransport   ErrorReporter / Notifier
//!   (domain_mandate)      (infra_rpc)     (this module)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across in-memory and database adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so they are thread-safe and usable
/// behind `Arc<dyn ...>` in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Category of a report sent to the error tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// The remote platform answered with something that is not a response
    TransportFault,
    /// Local data drifted into a state the integration cannot handle
    InconsistentState,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::TransportFault => f.write_str("transport_fault"),
            ReportKind::InconsistentState => f.write_str("inconsistent_state"),
        }
    }
}

/// A single report for the error-tracking collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ReportKind,
    pub message: String,
    /// Identifiers of the affected call or entity, e.g. `method`, `mandate_id`
    pub context: BTreeMap<String, String>,
}

impl ErrorReport {
    pub fn new(kind: ReportKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error tracking / monitoring collaborator
///
/// Reporting never fails from the caller's point of view; implementations
/// swallow their own delivery problems.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// An operational notification for the back-office team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Operational notification channel (mail in production)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Mandate", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Mandate"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_port_error_transient() {
        assert!(PortError::connection("pool timed out").is_transient());
        assert!(!PortError::conflict("remote id already set").is_transient());
    }

    #[test]
    fn test_error_report_context() {
        let report = ErrorReport::new(ReportKind::TransportFault, "bad body")
            .with_context("method", "partner.createPerson");

        assert_eq!(report.kind, ReportKind::TransportFault);
        assert_eq!(
            report.context.get("method"),
            Some(&"partner.createPerson".to_string())
        );
    }
}
