//! Transport configuration

use serde::Deserialize;
use std::time::Duration;

use crate::error::TransportError;

/// Connection settings for the portfolio platform
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// Full URL of the JSON-RPC endpoint
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl RpcConfig {
    /// Creates a configuration with default timeouts
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Checks that the configuration can be used to build a client
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.endpoint.trim().is_empty() {
            return Err(TransportError::configuration("endpoint must not be empty"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(TransportError::configuration(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.username.trim().is_empty() {
            return Err(TransportError::configuration("username must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(TransportError::configuration("timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_deserializing() {
        let config: RpcConfig = serde_json::from_value(serde_json::json!({
            "endpoint": "https://portfolio.example.com/rpc",
            "username": "broker",
            "password": "secret",
        }))
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = RpcConfig::new("ftp://portfolio.example.com", "broker", "secret");
        assert!(matches!(config.validate(), Err(TransportError::Configuration(_))));
    }
}
