//! Portfolio Event Domain
//!
//! Consumes the portfolio platform's event stream for tracked products:
//!
//! - **EventSyncService**: pulls the next event after a cursor, resolves it to
//!   a local product and dispatches it to listeners
//! - **ListenerRegistry**: transaction type → ordered listeners, built once
//! - **AuditTrailPort**: append-only log that doubles as the cursor store
//!
//! # Error classes
//!
//! | Class | Example | Handling |
//! |---|---|---|
//! | Protocol violation | event id not after the cursor | raised, nothing written |
//! | Known anomaly | event for an unknown contract | notified, audited, cursor advances |
//! | Unknown error | listener failure | notified, raised, nothing written |

pub mod error;
pub mod event;
pub mod audit;
pub mod listener;
pub mod resolution;
pub mod terminal;
pub mod service;

pub use error::{EventSyncError, ListenerError};
pub use event::RemoteEvent;
pub use audit::{AuditEntry, AuditTrailPort, InMemoryAuditTrail, EVENT_PULLED_ACTION, CURSOR_KEY};
pub use listener::{
    EventListener, ListenerRegistry, ListenerRegistryBuilder, TransferCompletedListener,
    TransferDeniedListener, ContractTerminatedListener, TRANSFER_COMPLETED, TRANSFER_DENIED,
    CONTRACT_TERMINATED,
};
pub use resolution::{EntityResolution, resolve_product};
pub use terminal::TerminalPredicate;
pub use service::{EventSyncContext, EventSyncService, DEFAULT_ACTOR};
