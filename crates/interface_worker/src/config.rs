//! Worker configuration
//!
//! Layered with the `config` crate: `config/sync_worker.toml` if present,
//! then `SYNC__*` environment variables with `__` between nested keys:
//!
//! ```text
//! SYNC__RPC__ENDPOINT=https://portfolio.example/api/jsonrpc
//! SYNC__RPC__USERNAME=broker
//! SYNC__RPC__PASSWORD=...
//! SYNC__DATABASE__URL=postgres://localhost/portfolio_sync
//! SYNC__DATABASE__MAX_CONNECTIONS=20
//! SYNC__TRANSFER__CUSTODY_POOL=fondsfinanz
//! SYNC__EVENTS__TERMINAL_TRANSACTION_TYPES=BESTANDSUEBERTRAGUNG_ABGESCHLOSSEN,VERTRAG_GEKUENDIGT
//! ```

use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use domain_events::{TerminalPredicate, DEFAULT_ACTOR, TRANSFER_COMPLETED};
use domain_transfer::{LineOfBusiness, StaticLineOfBusinessTable, TransferSettings};
use infra_db::DatabaseConfig;
use infra_rpc::RpcConfig;

/// Default location of the configuration file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "config/sync_worker";

const ENV_PREFIX: &str = "SYNC";

/// Worker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Portfolio platform connection
    pub rpc: RpcConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Stock transfer settings
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Pool recorded on products whose transfer was started
    #[serde(default = "default_custody_pool")]
    pub custody_pool: String,
    /// Category ident to line of business, layered over the standard table
    #[serde(default)]
    pub lines_of_business: HashMap<String, LineOfBusiness>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            custody_pool: default_custody_pool(),
            lines_of_business: HashMap::new(),
        }
    }
}

/// Event pull settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Actor recorded on audit entries
    #[serde(default = "default_actor")]
    pub actor: String,
    /// Transaction types that end a catch-up
    #[serde(default = "default_terminal_transaction_types")]
    pub terminal_transaction_types: Vec<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            actor: default_actor(),
            terminal_transaction_types: default_terminal_transaction_types(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_custody_pool() -> String {
    TransferSettings::default().custody_pool
}

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

fn default_terminal_transaction_types() -> Vec<String> {
    vec![TRANSFER_COMPLETED.to_string()]
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("events.terminal_transaction_types")
        .try_parsing(true)
}

impl WorkerConfig {
    /// Loads configuration from the default file and the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from `path` (optional) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a required key
    /// (the `rpc` section) is missing
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Parses a TOML document, ignoring the environment
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            custody_pool: self.transfer.custody_pool.clone(),
        }
    }

    /// The standard table with the configured entries on top
    pub fn lines_of_business(&self) -> StaticLineOfBusinessTable {
        self.transfer
            .lines_of_business
            .iter()
            .fold(StaticLineOfBusinessTable::standard(), |table, (ident, line)| {
                table.with_entry(ident.clone(), line.clone())
            })
    }

    pub fn terminal_predicate(&self) -> TerminalPredicate {
        TerminalPredicate::transaction_types(self.events.terminal_transaction_types.iter().cloned())
    }
}
