//! PostgreSQL audit trail adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{AuditEntryId, DomainPort, PortError, ProductId};
use domain_events::{AuditEntry, AuditTrailPort, CURSOR_KEY};

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
struct AuditRow {
    id: Uuid,
    actor: String,
    action: String,
    subject_id: Uuid,
    metadata: Value,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: AuditEntryId::from_uuid(row.id),
            actor: row.actor,
            action: row.action,
            subject: ProductId::from_uuid(row.subject_id),
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

/// Audit trail stored in `audit_entries`
///
/// The cursor lives in `metadata->>'event_pulled'`. Numeric and string
/// values are both cast to `bigint` before taking the maximum, so `"10"`
/// ranks above `"9"`.
#[derive(Debug, Clone)]
pub struct PostgresAuditTrail {
    pool: PgPool,
}

impl PostgresAuditTrail {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresAuditTrail {}

#[async_trait]
impl AuditTrailPort for PostgresAuditTrail {
    #[instrument(skip(self, entry), fields(subject = %entry.subject, action = %entry.action))]
    async fn append(&self, entry: AuditEntry) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO audit_entries (id, actor, action, subject_id, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*entry.id.as_uuid())
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(*entry.subject.as_uuid())
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!("Audit entry appended");
        Ok(())
    }

    async fn last_cursor(&self, subject: ProductId) -> Result<Option<i64>, PortError> {
        let cursor: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(btrim(metadata->>$2)::bigint) FROM audit_entries \
             WHERE subject_id = $1 AND btrim(metadata->>$2) ~ '^[0-9]+$'",
        )
        .bind(*subject.as_uuid())
        .bind(CURSOR_KEY)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(cursor)
    }

    async fn entries_for(&self, subject: ProductId) -> Result<Vec<AuditEntry>, PortError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, actor, action, subject_id, metadata, created_at FROM audit_entries \
             WHERE subject_id = $1 ORDER BY created_at, id",
        )
        .bind(*subject.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_maps_to_entry() {
        let subject = ProductId::new_v7();
        let row = AuditRow {
            id: Uuid::now_v7(),
            actor: "portfolio-sync".to_string(),
            action: "portfolio_event_pulled".to_string(),
            subject_id: *subject.as_uuid(),
            metadata: json!({"event_pulled": "12"}),
            created_at: Utc::now(),
        };

        let entry = AuditEntry::from(row);
        assert_eq!(entry.subject, subject);
        assert_eq!(entry.event_pulled(), Some(12));
    }
}
