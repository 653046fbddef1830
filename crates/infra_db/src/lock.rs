//! PostgreSQL advisory lock adapter
//!
//! Session-level advisory locks keyed by `hashtext(<lock key>)`. The lock is
//! held by a dedicated pooled connection for as long as the guard lives, so
//! every worker process sharing the database serializes on the same key.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::{debug, instrument, warn};

use core_kernel::{DomainPort, PortError};
use domain_mandate::{LockKey, SyncGuard, SyncLockPort};

use crate::error::DatabaseError;

/// Advisory-lock implementation of `SyncLockPort`
#[derive(Debug, Clone)]
pub struct PostgresSyncLock {
    pool: PgPool,
}

impl PostgresSyncLock {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PostgresSyncLock {}

#[async_trait]
impl SyncLockPort for PostgresSyncLock {
    #[instrument(skip_all, fields(lock_key = %key))]
    async fn acquire(&self, key: LockKey) -> Result<Box<dyn SyncGuard>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let key = key.as_string();

        sqlx::query("SELECT pg_advisory_lock(hashtext($1))")
            .bind(&key)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::from)?;

        debug!(lock_key = %key, "Advisory lock acquired");
        Ok(Box::new(AdvisoryGuard {
            conn: Some(conn),
            key,
        }))
    }
}

/// Holds the connection that owns the advisory lock
struct AdvisoryGuard {
    conn: Option<PoolConnection<Postgres>>,
    key: String,
}

#[async_trait]
impl SyncGuard for AdvisoryGuard {
    async fn release(mut self: Box<Self>) -> Result<(), PortError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let result: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT pg_advisory_unlock(hashtext($1))")
                .bind(&self.key)
                .fetch_one(&mut *conn)
                .await;
        let unlocked = match result {
            Ok(unlocked) => unlocked,
            Err(error) => {
                drop(conn.detach());
                return Err(DatabaseError::from(error).into());
            }
        };

        if !unlocked {
            warn!(lock_key = %self.key, "Advisory lock was not held at release");
        }
        debug!(lock_key = %self.key, "Advisory lock released");
        Ok(())
    }
}

impl Drop for AdvisoryGuard {
    fn drop(&mut self) {
        // Returning a locked session to the pool would leak the lock; closing
        // the session frees it on the server.
        if let Some(conn) = self.conn.take() {
            warn!(lock_key = %self.key, "Advisory lock dropped without release, closing session");
            drop(conn.detach());
        }
    }
}
