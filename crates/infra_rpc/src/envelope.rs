//! JSON-RPC envelope types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outgoing request envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    /// Builds a request with a fresh request id
    pub fn new(method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method,
            params,
        }
    }
}

/// Response envelope as received from the platform
///
/// The transport never interprets `error`; deciding what an application
/// error means is the caller's job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Builds a successful response
    pub fn success(result: Value) -> Self {
        Self {
            id: Value::Null,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an application error response
    pub fn failure(error: RpcError) -> Self {
        Self {
            id: Value::Null,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Looks up a nested value of the result, e.g. `["Person", "PersonID"]`
    pub fn result_at(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self.result.as_ref()?, |value, key| value.get(*key))
    }
}

/// Application-level error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Additional error data attached by the platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcErrorData {
    #[serde(rename = "debug-message", default)]
    pub debug_message: Option<String>,
}

impl RpcError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
            data: None,
        }
    }

    pub fn with_debug_message(mut self, debug_message: impl Into<String>) -> Self {
        self.data = Some(RpcErrorData {
            debug_message: Some(debug_message.into()),
        });
        self
    }

    /// The most specific human-readable message: the embedded debug message
    /// when present, otherwise the top-level message
    pub fn human_message(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.debug_message.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_shape() {
        let params = json!({"EreignisID": 0});
        let request = RpcRequest::new("ereignis.getNext", &params);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "ereignis.getNext");
        assert_eq!(json["params"]["EreignisID"], 0);
        assert!(Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_error_debug_message_is_preferred() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": "1",
            "result": null,
            "error": {
                "message": "Invalid params",
                "code": -32602,
                "data": {"debug-message": "Postleitzahl ist ungueltig"}
            }
        }))
        .unwrap();

        let error = response.error.as_ref().unwrap();
        assert!(response.is_error());
        assert_eq!(error.human_message(), "Postleitzahl ist ungueltig");
    }

    #[test]
    fn test_error_without_data_falls_back_to_message() {
        let error = RpcError::new("Internal error", -32603);
        assert_eq!(error.human_message(), "Internal error");
    }

    #[test]
    fn test_result_at_walks_nested_keys() {
        let response = RpcResponse::success(json!({"Person": {"PersonID": 454920238}}));
        assert_eq!(response.result_at(&["Person", "PersonID"]), Some(&json!(454920238)));
        assert_eq!(response.result_at(&["Person", "Missing"]), None);
        assert_eq!(RpcResponse::default().result_at(&["Person"]), None);
    }
}
