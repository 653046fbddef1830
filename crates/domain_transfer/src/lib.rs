//! Stock Transfer Domain
//!
//! Synchronizes a mandate, its mandate document and a product with the
//! insurance portfolio platform, then starts the portfolio transfer.
//!
//! # Layers
//!
//! - [`wire`]: pure mapping of local values to platform codes and formats
//! - [`payload`]: typed request payloads per RPC method
//! - [`schema`]: validation of payloads against the platform's JSON Schemas
//! - [`services`]: create-if-absent operation per remote concept
//! - [`orchestrator`]: the ordered, resumable, concurrency-safe pipeline
//!
//! # Idempotency
//!
//! The remote-id markers on the local entities are the only record of what
//! exists remotely. The orchestrator checks a marker, takes the entity's sync
//! lock, checks again and only then creates, so concurrent runs create every
//! remote entity at most once. Called directly, a service answers
//! [`SyncOutcome::AlreadySynced`] for an entity whose marker is set.

pub mod error;
pub mod wire;
pub mod payload;
pub mod schema;
pub mod lob;
pub mod services;
pub mod orchestrator;

pub use error::{SyncError, TransferFailure};
pub use schema::SchemaRegistry;
pub use lob::{LineOfBusiness, LineOfBusinessLookup, StaticLineOfBusinessTable};
pub use services::{EntitySyncService, SyncContext, SyncOutcome, TransferSettings};
pub use orchestrator::{StockTransferOrchestrator, SyncStep, TransferReport};
