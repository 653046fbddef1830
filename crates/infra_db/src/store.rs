//! PostgreSQL Mandate and Product Adapter
//!
//! Implements `MandatePort` and `ProductPort` on the `mandates`,
//! `mandate_documents` and `products` tables.
//!
//! Remote ids are write-once. Every marker update is a single conditional
//! statement:
//!
//! ```sql
//! UPDATE mandates SET remote_id = $2 WHERE id = $1
//!   AND (remote_id IS NULL OR remote_id = $2)
//! ```
//!
//! When no row matches, a follow-up read tells a missing row
//! (`PortError::NotFound`) from a marker that already holds another id
//! (`PortError::Conflict`).

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{DocumentId, DomainPort, MandateId, PortError, ProductId, RemoteId};
use domain_mandate::{ContactKind, Mandate, MandatePort, Product, ProductPort, ProductState};

use crate::error::DatabaseError;
use crate::rows::{DocumentRow, MandateRow, ProductRow, MANDATE_COLUMNS, PRODUCT_COLUMNS};

/// PostgreSQL-backed implementation of the mandate and product ports
#[derive(Debug, Clone)]
pub struct PostgresSyncStore {
    pool: PgPool,
}

impl PostgresSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_product(&self, id: Uuid) -> Result<Product, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Product", ProductId::from_uuid(id)))?;
        Product::try_from(row)
    }

    /// Sets a write-once remote id column
    ///
    /// `table` and `column` are compile-time constants of this module.
    async fn assign_remote_id(
        &self,
        entity: &str,
        table: &str,
        column: &str,
        id: Uuid,
        remote_id: &RemoteId,
    ) -> Result<(), DatabaseError> {
        let touches_updated_at = table != "mandate_documents";
        let sql = if touches_updated_at {
            format!(
                "UPDATE {table} SET {column} = $2, updated_at = now() \
                 WHERE id = $1 AND ({column} IS NULL OR {column} = $2)"
            )
        } else {
            format!(
                "UPDATE {table} SET {column} = $2 \
                 WHERE id = $1 AND ({column} IS NULL OR {column} = $2)"
            )
        };
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(remote_id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 1 {
            debug!(entity, %id, %remote_id, "Remote id recorded");
            return Ok(());
        }

        let existing: Option<Option<String>> =
            sqlx::query_scalar(&format!("SELECT {column} FROM {table} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match existing {
            None => Err(DatabaseError::not_found(entity, id)),
            Some(existing) => Err(DatabaseError::Conflict(format!(
                "{} {} already has remote id {}, refusing {}",
                entity,
                id,
                existing.unwrap_or_default(),
                remote_id
            ))),
        }
    }
}

impl DomainPort for PostgresSyncStore {}

#[async_trait]
impl MandatePort for PostgresSyncStore {
    #[instrument(skip(self), fields(mandate_id = %id))]
    async fn get_mandate(&self, id: MandateId) -> Result<Mandate, PortError> {
        let row = sqlx::query_as::<_, MandateRow>(&format!(
            "SELECT {} FROM mandates WHERE id = $1",
            MANDATE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| PortError::not_found("Mandate", id))?;

        let document = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, filename, content, remote_id FROM mandate_documents \
             WHERE mandate_id = $1 AND is_primary",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.into_mandate(document)?)
    }

    async fn set_person_remote_id(&self, id: MandateId, remote_id: &RemoteId) -> Result<(), PortError> {
        Ok(self
            .assign_remote_id("Mandate", "mandates", "remote_id", *id.as_uuid(), remote_id)
            .await?)
    }

    async fn set_contact_remote_id(
        &self,
        id: MandateId,
        kind: ContactKind,
        remote_id: &RemoteId,
    ) -> Result<(), PortError> {
        let column = match kind {
            ContactKind::Phone => "phone_remote_id",
            ContactKind::Email => "email_remote_id",
        };
        Ok(self
            .assign_remote_id("Mandate", "mandates", column, *id.as_uuid(), remote_id)
            .await?)
    }

    async fn set_document_remote_id(&self, id: DocumentId, remote_id: &RemoteId) -> Result<(), PortError> {
        Ok(self
            .assign_remote_id("MandateDocument", "mandate_documents", "remote_id", *id.as_uuid(), remote_id)
            .await?)
    }
}

#[async_trait]
impl ProductPort for PostgresSyncStore {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        Ok(self.fetch_product(*id.as_uuid()).await?)
    }

    async fn find_by_remote_id(&self, remote_id: &RemoteId) -> Result<Option<Product>, PortError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE remote_id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(remote_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(Product::try_from).transpose()?)
    }

    async fn set_product_remote_id(&self, id: ProductId, remote_id: &RemoteId) -> Result<(), PortError> {
        Ok(self
            .assign_remote_id("Product", "products", "remote_id", *id.as_uuid(), remote_id)
            .await?)
    }

    async fn mark_transfer_requested(&self, id: ProductId, pool: &str) -> Result<(), PortError> {
        let product = self.fetch_product(*id.as_uuid()).await?;
        if product.state != ProductState::TransferRequested
            && !product.state.can_transition_to(ProductState::TransferRequested)
        {
            return Err(PortError::conflict(format!(
                "Product {} cannot request a transfer from state {}",
                id, product.state
            )));
        }

        let result = sqlx::query(
            "UPDATE products SET state = $2, managed_by_pool = $3, updated_at = now() \
             WHERE id = $1 AND state IN ($4, $2)",
        )
        .bind(*id.as_uuid())
        .bind(ProductState::TransferRequested.as_str())
        .bind(pool)
        .bind(product.state.as_str())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(PortError::conflict(format!("Product {} changed state concurrently", id)));
        }
        Ok(())
    }

    async fn update_state(&self, id: ProductId, state: ProductState) -> Result<(), PortError> {
        let product = self.fetch_product(*id.as_uuid()).await?;
        if product.state == state {
            return Ok(());
        }
        if !product.state.can_transition_to(state) {
            return Err(PortError::conflict(format!(
                "Product {} cannot move from {} to {}",
                id, product.state, state
            )));
        }

        let result = sqlx::query("UPDATE products SET state = $2, updated_at = now() WHERE id = $1 AND state = $3")
            .bind(*id.as_uuid())
            .bind(state.as_str())
            .bind(product.state.as_str())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(PortError::conflict(format!("Product {} changed state concurrently", id)));
        }
        Ok(())
    }
}
