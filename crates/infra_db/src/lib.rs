//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the portfolio integration, built on SQLx:
//!
//! - [`PostgresSyncStore`]: mandates, mandate documents and products with
//!   write-once remote-id markers
//! - [`PostgresSyncLock`]: session-level advisory locks shared by every
//!   worker connected to the same database
//! - [`PostgresAuditTrail`]: the append-only audit trail that doubles as the
//!   event cursor store
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresSyncStore};
//!
//! let pool = create_pool(&DatabaseConfig::new("postgres://localhost/portfolio_sync")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresSyncStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod rows;
pub mod store;
pub mod lock;
pub mod audit;

pub use pool::{DatabasePool, DatabaseConfig, create_pool, run_migrations};
pub use error::DatabaseError;
pub use store::PostgresSyncStore;
pub use lock::PostgresSyncLock;
pub use audit::PostgresAuditTrail;
