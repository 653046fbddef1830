//! JSON-RPC transport to the insurance portfolio platform
//!
//! The platform exposes one endpoint speaking JSON-RPC 2.0 over HTTP with
//! basic authentication. This crate provides:
//!
//! - [`RpcTransport`]: the narrow `call(method, payload)` contract the sync
//!   services depend on
//! - [`JsonRpcClient`]: the reqwest-backed implementation
//! - [`RpcResponse`] / [`RpcError`]: the response envelope, returned verbatim
//!
//! # Fault isolation
//!
//! Malformed HTTP exchanges and undecodable bodies are *transport faults*.
//! They are reported to the [`ErrorReporter`](core_kernel::ErrorReporter) and
//! the call returns `Ok(None)`. Only programmer errors (empty method, payload
//! that is not a mapping) are returned as [`TransportError`].

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;

pub use client::{JsonRpcClient, RpcTransport, check_call_arguments};
pub use config::RpcConfig;
pub use envelope::{RpcRequest, RpcResponse, RpcError, RpcErrorData};
pub use error::TransportError;
