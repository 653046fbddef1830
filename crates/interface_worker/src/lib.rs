//! Sync Worker
//!
//! Outer caller of the portfolio integration. Loads configuration, wires the
//! PostgreSQL adapters and the JSON-RPC client into the stock-transfer
//! orchestrator and the event pull service, and routes error reports and
//! operational notifications into the log pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_worker::{Worker, WorkerConfig};
//!
//! let config = WorkerConfig::from_env()?;
//! let worker = Worker::connect(&config).await?;
//! let report = worker.transfer(product_id).await?;
//! ```

pub mod config;
pub mod error;
pub mod reporting;
pub mod worker;

pub use config::{WorkerConfig, TransferConfig, EventsConfig};
pub use error::WorkerError;
pub use reporting::{TracingErrorReporter, LogNotifier};
pub use worker::{Worker, Ports};
