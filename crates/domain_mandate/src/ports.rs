//! Mandate Domain Ports
//!
//! Port interfaces through which the portfolio integration reads and marks the
//! local entities it synchronizes.
//!
//! # Architecture
//!
//! - [`MandatePort`]: customer records, their contact channels and mandate
//!   document, plus the write-once remote markers on them
//! - [`ProductPort`]: contracts, their remote marker and lifecycle state
//! - [`SyncLockPort`]: the single mutual-exclusion point of the integration.
//!   Holding the guard for an entity serializes "check marker, create
//!   remotely, persist marker" across concurrent callers.
//!
//! Adapters:
//!
//! - **PostgreSQL** (`infra_db`): row updates plus session advisory locks
//! - **In-memory** ([`mock::InMemorySyncStore`], feature `mock`): for tests
//!
//! # Remote markers
//!
//! All `set_*_remote_id` operations are write-once: they succeed when the
//! marker is empty or already holds the same id, and fail with
//! `PortError::Conflict` otherwise.
//!
//! ```rust,ignore
//! let guard = locks.acquire(LockKey::Mandate(mandate.id)).await?;
//! let fresh = mandates.get_mandate(mandate.id).await?;
//! if fresh.remote_id.is_none() {
//!     let id = create_remotely(&fresh).await?;
//!     mandates.set_person_remote_id(fresh.id, &id).await?;
//! }
//! guard.release().await?;
//! ```

use async_trait::async_trait;
use std::fmt;

use core_kernel::{DocumentId, DomainPort, MandateId, PortError, ProductId, RemoteId};

use crate::mandate::{ContactKind, Mandate};
use crate::product::{Product, ProductState};

/// Port for mandates and their documents
#[async_trait]
pub trait MandatePort: DomainPort {
    /// Loads a mandate including its primary document
    async fn get_mandate(&self, id: MandateId) -> Result<Mandate, PortError>;

    /// Records the remote person id on the mandate
    async fn set_person_remote_id(&self, id: MandateId, remote_id: &RemoteId) -> Result<(), PortError>;

    /// Records the remote id of a communication channel
    async fn set_contact_remote_id(
        &self,
        id: MandateId,
        kind: ContactKind,
        remote_id: &RemoteId,
    ) -> Result<(), PortError>;

    /// Records the remote document id on a mandate document
    async fn set_document_remote_id(&self, id: DocumentId, remote_id: &RemoteId) -> Result<(), PortError>;
}

/// Port for products (insurance contracts)
#[async_trait]
pub trait ProductPort: DomainPort {
    /// Loads a product
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError>;

    /// Finds the product carrying the given remote contract id
    async fn find_by_remote_id(&self, remote_id: &RemoteId) -> Result<Option<Product>, PortError>;

    /// Records the remote contract id on the product
    async fn set_product_remote_id(&self, id: ProductId, remote_id: &RemoteId) -> Result<(), PortError>;

    /// Moves the product to `TransferRequested` and records the custody pool
    async fn mark_transfer_requested(&self, id: ProductId, pool: &str) -> Result<(), PortError>;

    /// Applies a lifecycle transition
    async fn update_state(&self, id: ProductId, state: ProductState) -> Result<(), PortError>;
}

/// The entity a sync lock is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    Mandate(MandateId),
    Document(DocumentId),
    Product(ProductId),
}

impl LockKey {
    /// Stable textual form, used to derive database lock keys
    pub fn as_string(&self) -> String {
        match self {
            LockKey::Mandate(id) => format!("mandate:{}", id.as_uuid()),
            LockKey::Document(id) => format!("document:{}", id.as_uuid()),
            LockKey::Product(id) => format!("product:{}", id.as_uuid()),
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// A held sync lock
///
/// Dropping the guard without calling `release` still frees the lock, but
/// adapters may do so less eagerly.
#[async_trait]
pub trait SyncGuard: Send {
    async fn release(self: Box<Self>) -> Result<(), PortError>;
}

/// Exclusive, entity-scoped lock shared by all callers of the integration
#[async_trait]
pub trait SyncLockPort: DomainPort {
    /// Waits until the lock for `key` is held by this caller
    async fn acquire(&self, key: LockKey) -> Result<Box<dyn SyncGuard>, PortError>;
}

/// Assigns a write-once marker
pub fn assign_remote_id(
    slot: &mut Option<RemoteId>,
    remote_id: &RemoteId,
    what: &str,
) -> Result<(), PortError> {
    match slot {
        Some(existing) if existing == remote_id => Ok(()),
        Some(existing) => Err(PortError::conflict(format!(
            "{} already has remote id {}, refusing {}",
            what, existing, remote_id
        ))),
        None => {
            *slot = Some(remote_id.clone());
            Ok(())
        }
    }
}

/// In-memory implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
    use chrono::Utc;

    use crate::mandate::MandateState;

    /// In-memory store implementing all three ports
    #[derive(Debug, Default)]
    pub struct InMemorySyncStore {
        mandates: RwLock<HashMap<MandateId, Mandate>>,
        products: RwLock<HashMap<ProductId, Product>>,
        locks: StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>,
        pending_states: StdMutex<HashMap<MandateId, MandateState>>,
    }

    impl InMemorySyncStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts or replaces a mandate
        pub async fn insert_mandate(&self, mandate: Mandate) {
            self.mandates.write().await.insert(mandate.id, mandate);
        }

        /// Inserts or replaces a product
        pub async fn insert_product(&self, product: Product) {
            self.products.write().await.insert(product.id, product);
        }

        /// Returns a snapshot of a mandate
        pub async fn mandate(&self, id: MandateId) -> Option<Mandate> {
            self.mandates.read().await.get(&id).cloned()
        }

        /// Returns a snapshot of a product
        pub async fn product(&self, id: ProductId) -> Option<Product> {
            self.products.read().await.get(&id).cloned()
        }

        /// Changes the mandate's state the next time its lock is acquired,
        /// simulating an update from elsewhere in the application
        pub fn change_state_on_next_lock(&self, id: MandateId, state: MandateState) {
            if let Ok(mut pending) = self.pending_states.lock() {
                pending.insert(id, state);
            }
        }

        fn lock_for(&self, key: LockKey) -> Result<Arc<Mutex<()>>, PortError> {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| PortError::internal("lock table poisoned"))?;
            Ok(locks.entry(key).or_default().clone())
        }

        async fn apply_pending_state(&self, key: LockKey) {
            let LockKey::Mandate(id) = key else { return };
            let pending = self
                .pending_states
                .lock()
                .ok()
                .and_then(|mut pending| pending.remove(&id));
            if let Some(state) = pending {
                if let Some(mandate) = self.mandates.write().await.get_mut(&id) {
                    mandate.state = state;
                    mandate.updated_at = Utc::now();
                }
            }
        }
    }

    impl DomainPort for InMemorySyncStore {}

    #[async_trait]
    impl MandatePort for InMemorySyncStore {
        async fn get_mandate(&self, id: MandateId) -> Result<Mandate, PortError> {
            self.mandate(id)
                .await
                .ok_or_else(|| PortError::not_found("Mandate", id))
        }

        async fn set_person_remote_id(&self, id: MandateId, remote_id: &RemoteId) -> Result<(), PortError> {
            let mut mandates = self.mandates.write().await;
            let mandate = mandates
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Mandate", id))?;
            assign_remote_id(&mut mandate.remote_id, remote_id, "Mandate")?;
            mandate.updated_at = Utc::now();
            Ok(())
        }

        async fn set_contact_remote_id(
            &self,
            id: MandateId,
            kind: ContactKind,
            remote_id: &RemoteId,
        ) -> Result<(), PortError> {
            let mut mandates = self.mandates.write().await;
            let mandate = mandates
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Mandate", id))?;
            let slot = match kind {
                ContactKind::Phone => &mut mandate.phone_remote_id,
                ContactKind::Email => &mut mandate.email_remote_id,
            };
            assign_remote_id(slot, remote_id, kind.as_str())?;
            mandate.updated_at = Utc::now();
            Ok(())
        }

        async fn set_document_remote_id(&self, id: DocumentId, remote_id: &RemoteId) -> Result<(), PortError> {
            let mut mandates = self.mandates.write().await;
            let document = mandates
                .values_mut()
                .filter_map(|m| m.primary_document.as_mut())
                .find(|d| d.id == id)
                .ok_or_else(|| PortError::not_found("MandateDocument", id))?;
            assign_remote_id(&mut document.remote_id, remote_id, "MandateDocument")
        }
    }

    #[async_trait]
    impl ProductPort for InMemorySyncStore {
        async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
            self.product(id)
                .await
                .ok_or_else(|| PortError::not_found("Product", id))
        }

        async fn find_by_remote_id(&self, remote_id: &RemoteId) -> Result<Option<Product>, PortError> {
            Ok(self
                .products
                .read()
                .await
                .values()
                .find(|p| p.remote_id.as_ref() == Some(remote_id))
                .cloned())
        }

        async fn set_product_remote_id(&self, id: ProductId, remote_id: &RemoteId) -> Result<(), PortError> {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Product", id))?;
            assign_remote_id(&mut product.remote_id, remote_id, "Product")?;
            product.updated_at = Utc::now();
            Ok(())
        }

        async fn mark_transfer_requested(&self, id: ProductId, pool: &str) -> Result<(), PortError> {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Product", id))?;
            if product.state != ProductState::TransferRequested {
                if !product.state.can_transition_to(ProductState::TransferRequested) {
                    return Err(PortError::conflict(format!(
                        "Product {} cannot request a transfer from state {}",
                        id, product.state
                    )));
                }
                product.state = ProductState::TransferRequested;
            }
            product.managed_by_pool = Some(pool.to_string());
            product.updated_at = Utc::now();
            Ok(())
        }

        async fn update_state(&self, id: ProductId, state: ProductState) -> Result<(), PortError> {
            let mut products = self.products.write().await;
            let product = products
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Product", id))?;
            if product.state == state {
                return Ok(());
            }
            if !product.state.can_transition_to(state) {
                return Err(PortError::conflict(format!(
                    "Product {} cannot move from {} to {}",
                    id, product.state, state
                )));
            }
            product.state = state;
            product.updated_at = Utc::now();
            Ok(())
        }
    }

    struct InMemoryGuard {
        _guard: OwnedMutexGuard<()>,
    }

    #[async_trait]
    impl SyncGuard for InMemoryGuard {
        async fn release(self: Box<Self>) -> Result<(), PortError> {
            Ok(())
        }
    }

    #[async_trait]
    impl SyncLockPort for InMemorySyncStore {
        async fn acquire(&self, key: LockKey) -> Result<Box<dyn SyncGuard>, PortError> {
            let guard = self.lock_for(key)?.lock_owned().await;
            self.apply_pending_state(key).await;
            Ok(Box::new(InMemoryGuard { _guard: guard }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemorySyncStore;
    use super::*;
    use crate::address::Address;
    use crate::document::MandateDocument;
    use crate::mandate::{Gender, MandateState};
    use std::sync::Arc;
    use std::time::Duration;

    fn mandate() -> Mandate {
        let mut mandate = Mandate::new(
            Gender::Male,
            "Max",
            "Mustermann",
            Address::new("Hauptstr.", "1", "10115", "Berlin", "DE"),
        );
        mandate.primary_document = Some(MandateDocument::new("mandate.pdf", b"%PDF".to_vec()));
        mandate
    }

    #[test]
    fn test_assign_remote_id_is_write_once() {
        let mut slot = None;
        assign_remote_id(&mut slot, &RemoteId::from(1), "Mandate").unwrap();
        assign_remote_id(&mut slot, &RemoteId::from(1), "Mandate").unwrap();
        let err = assign_remote_id(&mut slot, &RemoteId::from(2), "Mandate").unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }));
        assert_eq!(slot, Some(RemoteId::from(1)));
    }

    #[tokio::test]
    async fn test_document_remote_id_is_found_through_mandate() {
        let store = InMemorySyncStore::new();
        let mandate = mandate();
        let document_id = mandate.primary_document.as_ref().unwrap().id;
        store.insert_mandate(mandate.clone()).await;

        store.set_document_remote_id(document_id, &RemoteId::from(9)).await.unwrap();

        let stored = store.get_mandate(mandate.id).await.unwrap();
        assert_eq!(stored.primary_document.unwrap().remote_id, Some(RemoteId::from(9)));
    }

    #[tokio::test]
    async fn test_lock_serializes_holders() {
        let store = Arc::new(InMemorySyncStore::new());
        let key = LockKey::Mandate(MandateId::new());

        let guard = store.acquire(key).await.unwrap();
        let contender = {
            let store = store.clone();
            tokio::spawn(async move { store.acquire(key).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        guard.release().await.unwrap();
        contender.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_pending_state_applies_on_lock() {
        let store = InMemorySyncStore::new();
        let mandate = mandate();
        store.insert_mandate(mandate.clone()).await;
        store.change_state_on_next_lock(mandate.id, MandateState::Revoked);

        assert_eq!(store.get_mandate(mandate.id).await.unwrap().state, MandateState::Created);
        let guard = store.acquire(LockKey::Mandate(mandate.id)).await.unwrap();
        assert_eq!(store.get_mandate(mandate.id).await.unwrap().state, MandateState::Revoked);
        guard.release().await.unwrap();
    }
}
