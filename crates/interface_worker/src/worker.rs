//! Wiring of the sync services
//!
//! [`Worker`] owns one stock-transfer orchestrator and one event pull
//! service sharing the same transport and stores. Production wiring goes
//! through [`Worker::connect`]; tests hand in their own ports through
//! [`Worker::assemble`].

use std::sync::Arc;

use tracing::info;

use core_kernel::{ErrorReporter, Notifier, ProductId};
use domain_events::{
    AuditTrailPort, EventSyncContext, EventSyncError, EventSyncService, ListenerRegistry,
};
use domain_mandate::{MandatePort, ProductPort, SyncLockPort};
use domain_transfer::{
    SchemaRegistry, StockTransferOrchestrator, SyncContext, TransferFailure, TransferReport,
};
use infra_db::{
    create_pool, run_migrations, PostgresAuditTrail, PostgresSyncLock,
    PostgresSyncStore,
};
use infra_rpc::{JsonRpcClient, RpcTransport};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::reporting::{LogNotifier, TracingErrorReporter};

/// Storage ports the worker runs against
#[derive(Clone)]
pub struct Ports {
    pub mandates: Arc<dyn MandatePort>,
    pub products: Arc<dyn ProductPort>,
    pub locks: Arc<dyn SyncLockPort>,
    pub audit_trail: Arc<dyn AuditTrailPort>,
}

/// The assembled integration
#[derive(Debug, Clone)]
pub struct Worker {
    orchestrator: StockTransferOrchestrator,
    events: EventSyncService,
}

impl Worker {
    /// Connects to PostgreSQL and the portfolio platform
    ///
    /// Runs the embedded migrations before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, a migration fails or
    /// the transport configuration is invalid
    pub async fn connect(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let pool = create_pool(&config.database).await?;
        run_migrations(&pool).await?;

        let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);
        let transport = Arc::new(JsonRpcClient::new(config.rpc.clone(), reporter.clone())?);
        let store = Arc::new(PostgresSyncStore::new(pool.clone()));
        let ports = Ports {
            mandates: store.clone(),
            products: store,
            locks: Arc::new(PostgresSyncLock::new(pool.clone())),
            audit_trail: Arc::new(PostgresAuditTrail::new(pool)),
        };

        info!(endpoint = %config.rpc.endpoint, "Worker connected");
        Self::assemble(config, transport, ports, reporter, Arc::new(LogNotifier))
    }

    /// Builds the services over the given collaborators
    pub fn assemble(
        config: &WorkerConfig,
        transport: Arc<dyn RpcTransport>,
        ports: Ports,
        reporter: Arc<dyn ErrorReporter>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, WorkerError> {
        let schemas = Arc::new(SchemaRegistry::new()?);

        let orchestrator = StockTransferOrchestrator::new(SyncContext {
            transport: transport.clone(),
            mandates: ports.mandates,
            products: ports.products.clone(),
            locks: ports.locks,
            schemas: schemas.clone(),
            lines_of_business: Arc::new(config.lines_of_business()),
            reporter,
            settings: config.transfer_settings(),
        });

        let events = EventSyncService::new(EventSyncContext {
            transport,
            products: ports.products.clone(),
            audit_trail: ports.audit_trail,
            schemas,
            listeners: Arc::new(ListenerRegistry::with_builtin(ports.products)),
            notifier,
            actor: config.events.actor.clone(),
            terminal: config.terminal_predicate(),
        });

        Ok(Self { orchestrator, events })
    }

    pub async fn transfer(&self, product_id: ProductId) -> Result<TransferReport, TransferFailure> {
        self.orchestrator.run(product_id).await
    }

    pub async fn pull(&self, product_id: ProductId, cursor: Option<i64>) -> Result<Option<i64>, EventSyncError> {
        self.events.pull_next(product_id, cursor).await
    }

    pub async fn catch_up(&self, product_id: ProductId) -> Result<Vec<i64>, EventSyncError> {
        self.events.catch_up(product_id).await
    }
}
