//! Audit trail
//!
//! Append-only log of what the event pull did. Each entry's metadata carries
//! the cursor it advanced to under `event_pulled`, which makes the trail the
//! durable cursor store as well:
//!
//! ```text
//! {"event_pulled": 42, "transaction_type": "...", "processed_listeners": ["..."]}
//! ```
//!
//! The latest cursor of a stream is the numeric maximum of `event_pulled`
//! over the stream's entries. Older entries may hold the value as a string,
//! so comparison is never lexical.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use core_kernel::{AuditEntryId, DomainPort, PortError, ProductId};

/// Action name of every entry the event pull writes
pub const EVENT_PULLED_ACTION: &str = "portfolio_event_pulled";

/// Metadata key holding the cursor
pub const CURSOR_KEY: &str = "event_pulled";

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor: String,
    pub action: String,
    /// The tracked product the entry is about
    pub subject: ProductId,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        subject: ProductId,
        metadata: Value,
    ) -> Self {
        Self {
            id: AuditEntryId::new_v7(),
            actor: actor.into(),
            action: action.into(),
            subject,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// The cursor recorded by this entry, if any
    pub fn event_pulled(&self) -> Option<i64> {
        cursor_value(&self.metadata)
    }
}

/// Reads `event_pulled` as a number or a numeric string
pub fn cursor_value(metadata: &Value) -> Option<i64> {
    match metadata.get(CURSOR_KEY)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Port for the audit trail
#[async_trait]
pub trait AuditTrailPort: DomainPort {
    /// Appends an entry
    async fn append(&self, entry: AuditEntry) -> Result<(), PortError>;

    /// Highest cursor recorded for `subject`, compared numerically
    async fn last_cursor(&self, subject: ProductId) -> Result<Option<i64>, PortError>;

    /// All entries for `subject`, oldest first
    async fn entries_for(&self, subject: ProductId) -> Result<Vec<AuditEntry>, PortError>;
}

/// Audit trail held in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all subjects
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl DomainPort for InMemoryAuditTrail {}

#[async_trait]
impl AuditTrailPort for InMemoryAuditTrail {
    async fn append(&self, entry: AuditEntry) -> Result<(), PortError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn last_cursor(&self, subject: ProductId) -> Result<Option<i64>, PortError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.subject == subject)
            .filter_map(AuditEntry::event_pulled)
            .max())
    }

    async fn entries_for(&self, subject: ProductId) -> Result<Vec<AuditEntry>, PortError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.subject == subject)
            .cloned()
            .collect())
    }
}
