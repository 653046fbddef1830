//! Stock transfer orchestrator
//!
//! Pushes a product's customer, contact channels, mandate document and
//! contract to the portfolio platform and starts the portfolio transfer.
//!
//! # Pipeline
//!
//! ```text
//! person -> contact_details_phone -> contact_details_email
//!        -> mandate_document -> product -> transfer
//! ```
//!
//! Each step is guarded by its remote-id marker:
//!
//! 1. Marker set (or, for the phone step, no usable phone on file): the step
//!    is recorded as skipped and the platform is not called.
//! 2. Otherwise the entity's sync lock is taken, the entity reloaded and the
//!    marker checked again. A concurrent run that got there first has set it
//!    by now, so the step is skipped.
//! 3. Otherwise the sync service is called. A raised error, an application
//!    error in the response, or a transport fault all end up as one message
//!    under `errors`, and the remaining steps are not attempted.
//!
//! A run never rolls back. A later run resumes at the first step whose marker
//! is still empty.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use core_kernel::{ErrorReport, ProductId, ReportKind};
use domain_mandate::{LockKey, Mandate, MandateError, MandateState, Product};
use crate::error::{SyncError, TransferFailure};
use crate::payload;
use crate::services::{EntitySyncService, SyncContext, SyncOutcome};

/// One step of the stock transfer pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    Person,
    ContactDetailsPhone,
    ContactDetailsEmail,
    MandateDocument,
    Product,
    Transfer,
}

impl SyncStep {
    /// Steps in execution order
    pub const PIPELINE: [SyncStep; 6] = [
        SyncStep::Person,
        SyncStep::ContactDetailsPhone,
        SyncStep::ContactDetailsEmail,
        SyncStep::MandateDocument,
        SyncStep::Product,
        SyncStep::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::Person => "person",
            SyncStep::ContactDetailsPhone => "contact_details_phone",
            SyncStep::ContactDetailsEmail => "contact_details_email",
            SyncStep::MandateDocument => "mandate_document",
            SyncStep::Product => "product",
            SyncStep::Transfer => "transfer",
        }
    }

    /// RPC method the step calls
    pub fn method(&self) -> &'static str {
        match self {
            SyncStep::Person => payload::CREATE_PERSON,
            SyncStep::ContactDetailsPhone | SyncStep::ContactDetailsEmail => payload::CREATE_CONTACT_DETAILS,
            SyncStep::MandateDocument => payload::CREATE_DOCUMENT,
            SyncStep::Product => payload::CREATE_CONTRACT,
            SyncStep::Transfer => payload::START_TRANSFER,
        }
    }

    /// Whether the step needs no remote call for this state
    fn is_satisfied(&self, mandate: &Mandate, product: &Product) -> bool {
        match self {
            SyncStep::Person => mandate.remote_id.is_some(),
            SyncStep::ContactDetailsPhone => {
                mandate.phone_remote_id.is_some() || mandate.usable_phone().is_none()
            }
            SyncStep::ContactDetailsEmail => mandate.email_remote_id.is_some(),
            SyncStep::MandateDocument => mandate
                .primary_document
                .as_ref()
                .is_some_and(|document| document.is_synced()),
            SyncStep::Product => product.remote_id.is_some(),
            SyncStep::Transfer => product.transfer_requested(),
        }
    }

    fn lock_key(&self, mandate: &Mandate, product: &Product) -> Result<LockKey, SyncError> {
        Ok(match self {
            SyncStep::Person | SyncStep::ContactDetailsPhone | SyncStep::ContactDetailsEmail => {
                LockKey::Mandate(mandate.id)
            }
            SyncStep::MandateDocument => {
                let document = mandate
                    .primary_document
                    .as_ref()
                    .ok_or_else(|| MandateError::MissingDocument(mandate.id.to_string()))?;
                LockKey::Document(document.id)
            }
            SyncStep::Product | SyncStep::Transfer => LockKey::Product(product.id),
        })
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub skipped: BTreeMap<ProductId, Vec<SyncStep>>,
    pub actions: BTreeMap<ProductId, Vec<SyncStep>>,
}

impl TransferReport {
    /// Steps executed for `product_id` during the run
    pub fn actions_for(&self, product_id: ProductId) -> &[SyncStep] {
        self.actions.get(&product_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Steps skipped for `product_id` during the run
    pub fn skipped_for(&self, product_id: ProductId) -> &[SyncStep] {
        self.skipped.get(&product_id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Bookkeeping of one orchestrator invocation
#[derive(Debug, Default)]
struct TransferRun {
    errors: BTreeMap<ProductId, Vec<String>>,
    skipped: BTreeMap<ProductId, Vec<SyncStep>>,
    actions: BTreeMap<ProductId, Vec<SyncStep>>,
}

impl TransferRun {
    fn skip(&mut self, product_id: ProductId, step: SyncStep) {
        self.skipped.entry(product_id).or_default().push(step);
    }

    fn act(&mut self, product_id: ProductId, step: SyncStep) {
        self.actions.entry(product_id).or_default().push(step);
    }

    fn fail(&mut self, product_id: ProductId, message: String) {
        self.errors.entry(product_id).or_default().push(message);
    }

    fn finish(self) -> Result<TransferReport, TransferFailure> {
        if self.errors.values().any(|errors| !errors.is_empty()) {
            Err(TransferFailure {
                errors: self.errors,
                skipped: self.skipped,
                actions: self.actions,
                timestamp: Utc::now(),
            })
        } else {
            Ok(TransferReport {
                skipped: self.skipped,
                actions: self.actions,
            })
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StepOutcome {
    Skipped,
    Executed,
}

/// Runs the stock transfer pipeline for one product at a time
///
/// Safe to invoke concurrently for the same product from several tasks or
/// processes: each entity is created at most once.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = StockTransferOrchestrator::new(context);
/// match orchestrator.run(product_id).await {
///     Ok(report) => println!("executed {:?}", report.actions_for(product_id)),
///     Err(failure) => eprintln!("{}", failure),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StockTransferOrchestrator {
    service: EntitySyncService,
}

impl StockTransferOrchestrator {
    pub fn new(context: SyncContext) -> Self {
        Self {
            service: EntitySyncService::new(context),
        }
    }

    pub fn service(&self) -> &EntitySyncService {
        &self.service
    }

    fn context(&self) -> &SyncContext {
        self.service.context()
    }

    /// Runs the pipeline for a product
    ///
    /// # Returns
    ///
    /// * `Ok(report)` - every step is executed or skipped
    /// * `Err(failure)` - a step failed; `failure` carries the run's errors,
    ///   skipped steps and executed steps, and the failure time
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn run(&self, product_id: ProductId) -> Result<TransferReport, TransferFailure> {
        let mut run = TransferRun::default();

        let initial_state = match self.load(product_id).await {
            Ok((mandate, _)) => mandate.state,
            Err(error) => {
                warn!(error = %error, "Could not load product for stock transfer");
                run.fail(product_id, error.to_string());
                return run.finish();
            }
        };

        for step in SyncStep::PIPELINE {
            match self.run_step(step, product_id, initial_state).await {
                Ok(StepOutcome::Skipped) => {
                    debug!(step = %step, "Step already synchronized, skipping");
                    run.skip(product_id, step);
                }
                Ok(StepOutcome::Executed) => {
                    info!(step = %step, "Step executed");
                    run.act(product_id, step);
                }
                Err(message) => {
                    warn!(step = %step, error = %message, "Step failed, halting pipeline");
                    run.fail(product_id, message);
                    break;
                }
            }
        }

        run.finish()
    }

    async fn run_step(
        &self,
        step: SyncStep,
        product_id: ProductId,
        initial_state: MandateState,
    ) -> Result<StepOutcome, String> {
        let (mandate, product) = self.load(product_id).await.map_err(|e| e.to_string())?;
        if step.is_satisfied(&mandate, &product) {
            return Ok(StepOutcome::Skipped);
        }

        let key = step.lock_key(&mandate, &product).map_err(|e| e.to_string())?;
        let guard = self
            .context()
            .locks
            .acquire(key)
            .await
            .map_err(|e| e.to_string())?;

        let outcome = self.run_locked(step, product_id, initial_state).await;

        if let Err(error) = guard.release().await {
            warn!(step = %step, lock = %key, error = %error, "Releasing sync lock failed");
        }
        outcome
    }

    async fn run_locked(
        &self,
        step: SyncStep,
        product_id: ProductId,
        initial_state: MandateState,
    ) -> Result<StepOutcome, String> {
        let (mandate, product) = self.load(product_id).await.map_err(|e| e.to_string())?;
        if step.is_satisfied(&mandate, &product) {
            return Ok(StepOutcome::Skipped);
        }

        self.check_mandate_state(&mandate, initial_state)
            .map_err(|e| e.to_string())?;

        let result = match step {
            SyncStep::Person => self.service.create_person(&mandate).await,
            SyncStep::ContactDetailsPhone => self.service.create_contact_details_phone(&mandate).await,
            SyncStep::ContactDetailsEmail => self.service.create_contact_details_email(&mandate).await,
            SyncStep::MandateDocument => self.service.create_document(&mandate).await,
            SyncStep::Product => self.service.create_contract(&mandate, &product).await,
            SyncStep::Transfer => self.service.start_transfer(&mandate, &product).await,
        };

        step_result(step, result)
    }

    async fn load(&self, product_id: ProductId) -> Result<(Mandate, Product), SyncError> {
        let product = self.context().products.get_product(product_id).await?;
        let mandate = self.context().mandates.get_mandate(product.mandate_id).await?;
        Ok((mandate, product))
    }

    /// Distinguishes state drift during the run from a mandate that was never
    /// ready for synchronization
    fn check_mandate_state(&self, mandate: &Mandate, initial_state: MandateState) -> Result<(), SyncError> {
        if mandate.state == initial_state {
            if mandate.state.is_syncable() {
                return Ok(());
            }
            return Err(MandateError::validation_failed(vec![format!(
                "Mandate in state {} cannot be synchronized",
                mandate.state
            )])
            .into());
        }

        if mandate.state.is_syncable() {
            debug!(
                mandate_id = %mandate.id,
                from = %initial_state,
                to = %mandate.state,
                "Mandate state changed during run, still syncable"
            );
            return Ok(());
        }

        let message = format!(
            "Mandate {} changed from {} to {} during stock transfer",
            mandate.id, initial_state, mandate.state
        );
        warn!(mandate_id = %mandate.id, "{}", message);
        self.context().reporter.report(
            ErrorReport::new(ReportKind::InconsistentState, message.clone())
                .with_context("mandate_id", mandate.id.to_string())
                .with_context("state", mandate.state.as_str()),
        );
        Err(SyncError::InconsistentState(message))
    }
}

/// Folds raised errors, application errors and transport faults into one
/// message
fn step_result(step: SyncStep, result: Result<SyncOutcome, SyncError>) -> Result<StepOutcome, String> {
    match result.map_err(|error| error.to_string())? {
        SyncOutcome::AlreadySynced => Ok(StepOutcome::Skipped),
        SyncOutcome::Sent(None) => Err(format!("transport fault: no response for {}", step.method())),
        SyncOutcome::Sent(Some(response)) => match response.error {
            Some(error) => Err(error.human_message().to_string()),
            None => Ok(StepOutcome::Executed),
        },
    }
}
