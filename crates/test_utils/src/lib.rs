//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and fakes for the portfolio
//! integration test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built mandates, products and platform responses
//! - `builders`: Builder patterns for test data construction
//! - `transport`: A scripted, recording stand-in for the RPC transport
//! - `collaborators`: Recording notifier and error reporter
//! - `assertions`: Custom assertion helpers for sync outcomes
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod transport;
pub mod collaborators;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use transport::*;
pub use collaborators::*;
pub use assertions::*;
pub use generators::*;
