//! Transport contract and reqwest-backed client

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use core_kernel::{ErrorReport, ErrorReporter, ReportKind};

use crate::config::RpcConfig;
use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::TransportError;

/// Request/response exchange with the portfolio platform
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Calls `method` with `payload`
    ///
    /// # Arguments
    ///
    /// * `method` - Dot-namespaced method name, must not be empty
    /// * `payload` - Parameters, must be a JSON object
    ///
    /// # Returns
    ///
    /// * `Ok(Some(response))` - The response exactly as received, including
    ///   any application-level error
    /// * `Ok(None)` - A transport fault occurred and was reported
    /// * `Err(_)` - The arguments were invalid; nothing was sent
    async fn call(&self, method: &str, payload: &Value) -> Result<Option<RpcResponse>, TransportError>;
}

/// Validates the arguments of [`RpcTransport::call`]
///
/// Every transport implementation applies the same checks before anything
/// goes over the wire.
pub fn check_call_arguments(method: &str, payload: &Value) -> Result<(), TransportError> {
    if method.trim().is_empty() {
        return Err(TransportError::invalid_argument("method must be a non-empty string"));
    }
    match payload {
        Value::Object(_) => Ok(()),
        Value::Null => Err(TransportError::invalid_argument("payload is required")),
        _ => Err(TransportError::invalid_argument("payload must be a mapping")),
    }
}

/// JSON-RPC 2.0 client over HTTP with basic authentication
pub struct JsonRpcClient {
    config: RpcConfig,
    http_client: reqwest::Client,
    reporter: Arc<dyn ErrorReporter>,
}

impl fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("endpoint", &self.config.endpoint)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}

impl JsonRpcClient {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, credentials and timeouts
    /// * `reporter` - Receives transport faults
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Configuration` if the configuration is
    /// incomplete or the HTTP client cannot be built.
    pub fn new(config: RpcConfig, reporter: Arc<dyn ErrorReporter>) -> Result<Self, TransportError> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|error| TransportError::configuration(error.to_string()))?;

        Ok(Self {
            config,
            http_client,
            reporter,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn report_fault(&self, method: &str, message: String) {
        warn!(method, error = %message, "Transport fault");
        self.reporter.report(
            ErrorReport::new(ReportKind::TransportFault, message)
                .with_context("method", method)
                .with_context("endpoint", self.config.endpoint.clone()),
        );
    }

    async fn exchange(&self, request: &RpcRequest<'_>) -> Result<RpcResponse, String> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header("Accept", "application/json")
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(request)
            .send()
            .await
            .map_err(|error| format!("request failed: {}", error))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| format!("reading response body failed (HTTP {}): {}", status, error))?;

        let json: Value = serde_json::from_slice(&body)
            .map_err(|error| format!("malformed JSON body (HTTP {}): {}", status, error))?;
        if !json.is_object() {
            return Err(format!("response body is not an object (HTTP {})", status));
        }
        serde_json::from_value(json)
            .map_err(|error| format!("malformed response envelope (HTTP {}): {}", status, error))
    }
}

#[async_trait]
impl RpcTransport for JsonRpcClient {
    async fn call(&self, method: &str, payload: &Value) -> Result<Option<RpcResponse>, TransportError> {
        check_call_arguments(method, payload)?;

        let request = RpcRequest::new(method, payload);
        debug!(method, request_id = %request.id, "Sending RPC request");

        match self.exchange(&request).await {
            Ok(response) => {
                if let Some(error) = &response.error {
                    debug!(method, code = ?error.code, message = %error.message, "RPC application error");
                }
                Ok(Some(response))
            }
            Err(message) => {
                self.report_fault(method, message);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_method_is_rejected() {
        let result = check_call_arguments("  ", &json!({}));
        assert!(matches!(result, Err(TransportError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_payload_is_rejected() {
        let result = check_call_arguments("partner.createPerson", &Value::Null);
        assert!(matches!(result, Err(TransportError::InvalidArgument(_))));
    }

    #[test]
    fn test_non_mapping_payload_is_rejected() {
        let result = check_call_arguments("partner.createPerson", &json!([1, 2]));
        assert!(matches!(result, Err(TransportError::InvalidArgument(_))));
    }

    #[test]
    fn test_mapping_payload_is_accepted() {
        assert!(check_call_arguments("partner.createPerson", &json!({})).is_ok());
    }
}
