//! Connection pool and migrations
//!
//! Every held sync lock pins one pooled connection until it is released, so
//! `max_connections` bounds the number of entities a worker can hold locked
//! at once, plus the connections the adapters need for their own queries.

use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// The `[database]` section of the worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a free connection, which includes waiting behind
    /// held sync locks
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
}

fn default_url() -> String {
    "postgres://localhost/portfolio_sync".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_max_lifetime_secs() -> u64 {
    1800
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(default_url())
    }
}

impl DatabaseConfig {
    /// Pool settings with defaults for the given connection string
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_lifetime_secs: default_max_lifetime_secs(),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// Checks the settings before any connection is attempted
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ConnectionFailed` naming the offending key
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.url.trim().is_empty() {
            return Err(DatabaseError::ConnectionFailed("database.url must not be empty".into()));
        }
        // One connection for the held lock, one for the reload under it.
        if self.max_connections < 2 {
            return Err(DatabaseError::ConnectionFailed(
                "database.max_connections must be at least 2".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(DatabaseError::ConnectionFailed(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.acquire_timeout_secs == 0 {
            return Err(DatabaseError::ConnectionFailed(
                "database.acquire_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Validates the settings and opens the pool
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` for invalid settings or an
/// unreachable server
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    config.validate()?;
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Opening database pool"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// Applies the embedded migrations (`migrations/`)
///
/// # Errors
///
/// Returns `DatabaseError::MigrationFailed` if a migration cannot be applied
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();

        assert_eq!(config.url, "postgres://localhost/portfolio_sync");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_lifetime(), Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_connection_pool_is_rejected() {
        let config = DatabaseConfig {
            max_connections: 1,
            min_connections: 1,
            ..DatabaseConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("max_connections"));
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let config = DatabaseConfig {
            max_connections: 4,
            min_connections: 5,
            ..DatabaseConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("min_connections (5)"));
    }

    #[test]
    fn test_empty_url_is_rejected() {
        assert!(DatabaseConfig::new(" ").validate().is_err());
    }
}
