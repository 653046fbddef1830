//! Event listeners
//!
//! A listener reacts to one kind of business transaction on a resolved
//! product. The registry maps transaction types to an ordered listener list;
//! it is built once at startup and read-only afterwards.
//!
//! # Built-in listeners
//!
//! | Transaction type | Listener | Effect |
//! |---|---|---|
//! | `BESTANDSUEBERTRAGUNG_ABGESCHLOSSEN` | [`TransferCompletedListener`] | product → `UnderManagement` |
//! | `BESTANDSUEBERTRAGUNG_ABGELEHNT` | [`TransferDeniedListener`] | product → `TransferDenied`, notification |
//! | `VERTRAG_GEKUENDIGT` | [`ContractTerminatedListener`] | product → `Terminated` |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use core_kernel::{Notification, Notifier};
use domain_mandate::{Product, ProductPort, ProductState};

use crate::error::ListenerError;
use crate::event::RemoteEvent;

pub const TRANSFER_COMPLETED: &str = "BESTANDSUEBERTRAGUNG_ABGESCHLOSSEN";
pub const TRANSFER_DENIED: &str = "BESTANDSUEBERTRAGUNG_ABGELEHNT";
pub const CONTRACT_TERMINATED: &str = "VERTRAG_GEKUENDIGT";

/// Handler for events of one business transaction type
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Name recorded in the audit trail
    fn name(&self) -> &'static str;

    async fn process_event(
        &self,
        event: &RemoteEvent,
        product: &Product,
        notifier: &dyn Notifier,
    ) -> Result<(), ListenerError>;
}

/// Transaction type → ordered listeners
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Arc<dyn EventListener>>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (transaction_type, listeners) in &self.listeners {
            let names: Vec<_> = listeners.iter().map(|l| l.name()).collect();
            map.entry(transaction_type, &names);
        }
        map.finish()
    }
}

impl ListenerRegistry {
    pub fn builder() -> ListenerRegistryBuilder {
        ListenerRegistryBuilder::default()
    }

    /// Registry with the built-in listeners
    pub fn with_builtin(products: Arc<dyn ProductPort>) -> Self {
        Self::builder()
            .register(TRANSFER_COMPLETED, Arc::new(TransferCompletedListener::new(products.clone())))
            .register(TRANSFER_DENIED, Arc::new(TransferDeniedListener::new(products.clone())))
            .register(CONTRACT_TERMINATED, Arc::new(ContractTerminatedListener::new(products)))
            .build()
    }

    /// Listeners for `transaction_type`, in registration order
    ///
    /// An unregistered type has no listeners.
    pub fn listeners_for(&self, transaction_type: &str) -> &[Arc<dyn EventListener>] {
        self.listeners
            .get(transaction_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct ListenerRegistryBuilder {
    listeners: HashMap<String, Vec<Arc<dyn EventListener>>>,
}

impl ListenerRegistryBuilder {
    /// Appends `listener` to the list for `transaction_type`
    pub fn register(mut self, transaction_type: impl Into<String>, listener: Arc<dyn EventListener>) -> Self {
        self.listeners
            .entry(transaction_type.into())
            .or_default()
            .push(listener);
        self
    }

    pub fn build(self) -> ListenerRegistry {
        ListenerRegistry {
            listeners: self.listeners,
        }
    }
}

/// The portfolio transfer went through; the broker manages the contract now
pub struct TransferCompletedListener {
    products: Arc<dyn ProductPort>,
}

impl TransferCompletedListener {
    pub fn new(products: Arc<dyn ProductPort>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl EventListener for TransferCompletedListener {
    fn name(&self) -> &'static str {
        "TransferCompletedListener"
    }

    async fn process_event(
        &self,
        event: &RemoteEvent,
        product: &Product,
        _notifier: &dyn Notifier,
    ) -> Result<(), ListenerError> {
        self.products
            .update_state(product.id, ProductState::UnderManagement)
            .await?;
        info!(product_id = %product.id, event_id = event.event_id, "Portfolio transfer completed");
        Ok(())
    }
}

/// The insurer refused the portfolio transfer
pub struct TransferDeniedListener {
    products: Arc<dyn ProductPort>,
}

impl TransferDeniedListener {
    pub fn new(products: Arc<dyn ProductPort>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl EventListener for TransferDeniedListener {
    fn name(&self) -> &'static str {
        "TransferDeniedListener"
    }

    async fn process_event(
        &self,
        event: &RemoteEvent,
        product: &Product,
        notifier: &dyn Notifier,
    ) -> Result<(), ListenerError> {
        self.products
            .update_state(product.id, ProductState::TransferDenied)
            .await?;
        notifier
            .notify(Notification::new(
                format!("Portfolio transfer denied for policy {}", product.policy_number),
                format!(
                    "The insurer {} denied the portfolio transfer of product {} (event {}).\n\n{}",
                    product.insurer.name, product.id, event.event_id, event.payload
                ),
            ))
            .await;
        info!(product_id = %product.id, event_id = event.event_id, "Portfolio transfer denied");
        Ok(())
    }
}

/// The contract was terminated
pub struct ContractTerminatedListener {
    products: Arc<dyn ProductPort>,
}

impl ContractTerminatedListener {
    pub fn new(products: Arc<dyn ProductPort>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl EventListener for ContractTerminatedListener {
    fn name(&self) -> &'static str {
        "ContractTerminatedListener"
    }

    async fn process_event(
        &self,
        event: &RemoteEvent,
        product: &Product,
        _notifier: &dyn Notifier,
    ) -> Result<(), ListenerError> {
        self.products
            .update_state(product.id, ProductState::Terminated)
            .await?;
        info!(product_id = %product.id, event_id = event.event_id, "Contract terminated");
        Ok(())
    }
}
