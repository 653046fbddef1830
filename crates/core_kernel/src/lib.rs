//! Core Kernel - Foundational types and utilities for the portfolio integration
//!
//! This crate provides the fundamental building blocks used across all crates:
//! - Money types with precise decimal arithmetic
//! - Strongly typed local and remote identifiers
//! - Port infrastructure and the operational collaborators (error tracking,
//!   notifications)

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, UnknownCurrency};
pub use identifiers::{MandateId, DocumentId, ProductId, AuditEntryId, RemoteId};
pub use ports::{
    PortError, DomainPort,
    ErrorReporter, ErrorReport, ReportKind, Notifier, Notification,
};
