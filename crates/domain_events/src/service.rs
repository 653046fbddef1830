//! Event pull service
//!
//! Advances a tracked product's event stream one event at a time. The
//! product's remote contract id scopes the stream; the cursor is the id of
//! the last event handled and lives in the audit trail.
//!
//! # One pull
//!
//! 1. Ask `ereignis.getNext` for the first event after the cursor. Nothing
//!    there: return `None`, write nothing.
//! 2. The event id must be greater than the cursor, else fail fast. A racing
//!    puller on the same stream ends up here instead of double-processing.
//! 3. Resolve the event's contract to a local product.
//!    - Missing (known error): notify, audit the cursor with the error
//!      details, return the new cursor.
//!    - Found: run the listeners registered for the transaction type in
//!      order. A failing listener (unknown error) is notified and raised
//!      without an audit entry, so the event is retried next time.
//!      Otherwise audit the cursor with the listener names and return it.

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{Notification, Notifier, ProductId, RemoteId};
use domain_mandate::{Product, ProductPort};
use domain_transfer::payload::{self, to_params, EventPullPayload};
use domain_transfer::SchemaRegistry;
use infra_rpc::RpcTransport;

use crate::audit::{AuditEntry, AuditTrailPort, EVENT_PULLED_ACTION};
use crate::error::EventSyncError;
use crate::event::RemoteEvent;
use crate::listener::ListenerRegistry;
use crate::resolution::{resolve_product, EntityResolution};
use crate::terminal::TerminalPredicate;

/// Default audit actor
pub const DEFAULT_ACTOR: &str = "portfolio-sync";

#[derive(Clone)]
pub struct EventSyncContext {
    pub transport: Arc<dyn RpcTransport>,
    pub products: Arc<dyn ProductPort>,
    pub audit_trail: Arc<dyn AuditTrailPort>,
    pub schemas: Arc<SchemaRegistry>,
    pub listeners: Arc<ListenerRegistry>,
    pub notifier: Arc<dyn Notifier>,
    /// Recorded as the actor of every audit entry
    pub actor: String,
    pub terminal: TerminalPredicate,
}

impl fmt::Debug for EventSyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSyncContext")
            .field("listeners", &self.listeners)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

/// A pull that advanced the cursor
struct Advanced {
    cursor: i64,
    terminal: bool,
}

#[derive(Debug, Clone)]
pub struct EventSyncService {
    context: EventSyncContext,
}

impl EventSyncService {
    pub fn new(context: EventSyncContext) -> Self {
        Self { context }
    }

    /// Handles the next event of the product's stream
    ///
    /// # Arguments
    ///
    /// * `product_id` - The tracked product
    /// * `cursor` - Last handled event id; defaults to the latest cursor in
    ///   the audit trail, or 0
    ///
    /// # Returns
    ///
    /// The new cursor, or `None` if the stream has nothing after `cursor`.
    ///
    /// # Errors
    ///
    /// - `EventSyncError::NonMonotonic` if the platform returns an event at
    ///   or before the cursor
    /// - `EventSyncError::Listener` if a listener fails
    /// - `EventSyncError::TransportFault` / `Remote` if the pull itself fails
    #[instrument(skip_all, fields(product_id = %product_id, cursor = ?cursor))]
    pub async fn pull_next(
        &self,
        product_id: ProductId,
        cursor: Option<i64>,
    ) -> Result<Option<i64>, EventSyncError> {
        Ok(self
            .pull(product_id, cursor)
            .await?
            .map(|advanced| advanced.cursor))
    }

    /// Pulls until the stream is drained or a terminal event was handled
    ///
    /// Starts at the latest cursor in the audit trail. Returns every cursor
    /// advanced to, in order. Events after a terminal one stay in the stream
    /// for the next pull.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn catch_up(&self, product_id: ProductId) -> Result<Vec<i64>, EventSyncError> {
        let mut cursor = self.last_cursor(product_id).await?;
        let mut advanced = Vec::new();

        while let Some(step) = self.pull(product_id, Some(cursor)).await? {
            advanced.push(step.cursor);
            cursor = step.cursor;
            if step.terminal {
                info!(cursor, "Terminal event handled, stopping catch-up");
                break;
            }
        }

        debug!(pulled = advanced.len(), "Catch-up finished");
        Ok(advanced)
    }

    /// Latest recorded cursor of the product's stream, 0 if none
    pub async fn last_cursor(&self, product_id: ProductId) -> Result<i64, EventSyncError> {
        Ok(self
            .context
            .audit_trail
            .last_cursor(product_id)
            .await?
            .unwrap_or(0))
    }

    async fn pull(
        &self,
        product_id: ProductId,
        cursor: Option<i64>,
    ) -> Result<Option<Advanced>, EventSyncError> {
        let tracked = self.context.products.get_product(product_id).await?;
        let contract_id = tracked.remote_id.as_ref().ok_or_else(|| {
            EventSyncError::invalid_argument(format!("Product {} has no remote contract id", product_id))
        })?;
        let cursor = match cursor {
            Some(cursor) if cursor < 0 => {
                return Err(EventSyncError::invalid_argument(format!("negative cursor {}", cursor)))
            }
            Some(cursor) => cursor,
            None => self.last_cursor(product_id).await?,
        };

        let Some(event) = self.fetch(cursor, contract_id).await? else {
            debug!(cursor, "No event after cursor");
            return Ok(None);
        };
        if event.event_id <= cursor {
            error!(cursor, received = event.event_id, "Event stream went backwards");
            return Err(EventSyncError::NonMonotonic {
                cursor,
                received: event.event_id,
            });
        }
        info!(
            cursor,
            event_id = event.event_id,
            transaction_type = %event.transaction_type,
            "Pulled event"
        );

        match resolve_product(self.context.products.as_ref(), &event).await? {
            EntityResolution::Missing { object_type } => {
                self.record_missing(&tracked, &event, object_type).await?;
            }
            EntityResolution::Found(product) => {
                self.dispatch(&tracked, &product, &event).await?;
            }
        }

        // Judged on the tracked product; see `TerminalPredicate`.
        Ok(Some(Advanced {
            cursor: event.event_id,
            terminal: self.context.terminal.is_terminal(&event.transaction_type, &tracked),
        }))
    }

    async fn fetch(&self, cursor: i64, contract_id: &RemoteId) -> Result<Option<RemoteEvent>, EventSyncError> {
        let params = to_params(&EventPullPayload::new(cursor, Some(contract_id)))?;
        self.context.schemas.validate(payload::PULL_EVENT, &params)?;

        let response = self
            .context
            .transport
            .call(payload::PULL_EVENT, &params)
            .await?
            .ok_or_else(|| EventSyncError::TransportFault {
                method: payload::PULL_EVENT.to_string(),
            })?;
        if let Some(error) = response.error {
            return Err(EventSyncError::Remote(error.human_message().to_string()));
        }
        RemoteEvent::from_result(response.result.as_ref())
    }

    async fn record_missing(
        &self,
        tracked: &Product,
        event: &RemoteEvent,
        object_type: &str,
    ) -> Result<(), EventSyncError> {
        warn!(
            event_id = event.event_id,
            object_type,
            contract_id = ?event.contract_id,
            "Event references an unknown local object"
        );
        self.context
            .notifier
            .notify(Notification::new(
                format!("Portfolio event {} references an unknown {}", event.event_id, object_type),
                format!(
                    "Event {} ({}) for contract {} has no local {}.\n\n{}",
                    event.event_id,
                    event.transaction_type,
                    event
                        .contract_id
                        .as_ref()
                        .map(RemoteId::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    object_type,
                    event.payload
                ),
            ))
            .await;

        self.audit(
            tracked,
            json!({
                "event_pulled": event.event_id,
                "transaction_type": event.transaction_type,
                "error_details": [{"error": "object missing", "object_type": object_type}],
                "processed_listeners": [],
            }),
        )
        .await
    }

    async fn dispatch(
        &self,
        tracked: &Product,
        product: &Product,
        event: &RemoteEvent,
    ) -> Result<(), EventSyncError> {
        let mut processed = Vec::new();
        for listener in self.context.listeners.listeners_for(&event.transaction_type) {
            if let Err(failure) = listener
                .process_event(event, product, self.context.notifier.as_ref())
                .await
            {
                error!(
                    listener = listener.name(),
                    event_id = event.event_id,
                    error = %failure,
                    "Listener failed"
                );
                self.context
                    .notifier
                    .notify(Notification::new(
                        format!("Portfolio event {} failed in {}", event.event_id, listener.name()),
                        format!("{}\n\n{}", failure, event.payload),
                    ))
                    .await;
                return Err(EventSyncError::Listener {
                    listener: listener.name().to_string(),
                    event_id: event.event_id,
                    message: failure.to_string(),
                });
            }
            processed.push(listener.name());
        }

        self.audit(
            tracked,
            json!({
                "event_pulled": event.event_id,
                "transaction_type": event.transaction_type,
                "processed_listeners": processed,
            }),
        )
        .await
    }

    async fn audit(&self, tracked: &Product, metadata: serde_json::Value) -> Result<(), EventSyncError> {
        let entry = AuditEntry::new(&self.context.actor, EVENT_PULLED_ACTION, tracked.id, metadata);
        self.context.audit_trail.append(entry).await?;
        Ok(())
    }
}
