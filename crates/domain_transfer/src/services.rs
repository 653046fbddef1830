//! Entity sync services
//!
//! One create-if-absent operation per remote concept. All of them share the
//! same shape:
//!
//! 1. Return `SyncOutcome::AlreadySynced` if the entity's remote-id marker
//!    is set, without calling the platform
//! 2. Check prerequisites (validity, remote ids of referenced entities)
//! 3. Build the typed payload and check it against the platform schema
//! 4. Call the transport
//! 5. On success, persist the returned remote id onto the local entity
//!
//! Prerequisite failures are raised. Remote application errors are returned
//! inside the response and leave local state untouched; interpreting them is
//! up to the caller.
//!
//! The marker check here only sees the entity as passed in. Serializing
//! concurrent runs on the same entity is the orchestrator's job, under the
//! entity's sync lock.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use core_kernel::{ErrorReporter, RemoteId};
use domain_mandate::{
    ContactKind, Mandate, MandateError, MandatePort, MandateValidator, Product, ProductPort,
    SyncLockPort,
};
use infra_rpc::{RpcResponse, RpcTransport};

use crate::error::SyncError;
use crate::lob::LineOfBusinessLookup;
use crate::payload::{
    self, to_params, ContactDetailsPayload, ContractPayload, DocumentPayload, PersonPayload,
    TransferPayload,
};
use crate::schema::SchemaRegistry;

/// Settings of the stock transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Custody pool recorded on products whose transfer was started
    pub custody_pool: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            custody_pool: "portfolio".to_string(),
        }
    }
}

/// Collaborators shared by the sync services and the orchestrator
#[derive(Clone)]
pub struct SyncContext {
    pub transport: Arc<dyn RpcTransport>,
    pub mandates: Arc<dyn MandatePort>,
    pub products: Arc<dyn ProductPort>,
    pub locks: Arc<dyn SyncLockPort>,
    pub schemas: Arc<SchemaRegistry>,
    pub lines_of_business: Arc<dyn LineOfBusinessLookup>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub settings: TransferSettings,
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("schemas", &self.schemas)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Result of a create-if-absent operation
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The remote-id marker was already set; the platform was not called
    AlreadySynced,
    /// The platform was called; `None` is a transport fault
    Sent(Option<RpcResponse>),
}

impl SyncOutcome {
    pub fn is_already_synced(&self) -> bool {
        matches!(self, SyncOutcome::AlreadySynced)
    }

    /// The platform's response, if a call was made and answered
    pub fn into_response(self) -> Option<RpcResponse> {
        match self {
            SyncOutcome::Sent(response) => response,
            SyncOutcome::AlreadySynced => None,
        }
    }
}

/// Create-if-absent operations against the portfolio platform
#[derive(Debug, Clone)]
pub struct EntitySyncService {
    context: SyncContext,
}

impl EntitySyncService {
    pub fn new(context: SyncContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    /// Creates the remote person for a mandate
    ///
    /// # Errors
    ///
    /// * `SyncError::Validation` - the mandate fails its validity rules; the
    ///   message joins every violation
    /// * `SyncError::Schema` - the payload violates the platform schema
    /// * `SyncError::MalformedResponse` - a success without a person id
    pub async fn create_person(&self, mandate: &Mandate) -> Result<SyncOutcome, SyncError> {
        if mandate.is_synced() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        MandateValidator::validate(mandate).into_result()?;

        let params = to_params(&PersonPayload::from_mandate(mandate))?;
        let response = self.send(payload::CREATE_PERSON, params).await?;

        if let Some(remote_id) = success_id(payload::CREATE_PERSON, &response, &["Person", "PersonID"])? {
            self.context.mandates.set_person_remote_id(mandate.id, &remote_id).await?;
            info!(mandate_id = %mandate.id, remote_id = %remote_id, "Created remote person");
        }
        Ok(SyncOutcome::Sent(response))
    }

    /// Creates the remote phone channel of a mandate
    pub async fn create_contact_details_phone(&self, mandate: &Mandate) -> Result<SyncOutcome, SyncError> {
        self.create_contact_details(mandate, ContactKind::Phone).await
    }

    /// Creates the remote e-mail channel of a mandate
    pub async fn create_contact_details_email(&self, mandate: &Mandate) -> Result<SyncOutcome, SyncError> {
        self.create_contact_details(mandate, ContactKind::Email).await
    }

    async fn create_contact_details(
        &self,
        mandate: &Mandate,
        kind: ContactKind,
    ) -> Result<SyncOutcome, SyncError> {
        if mandate.contact_remote_id(kind).is_some() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        let partner_id = require_person(mandate)?;
        let address = mandate.contact(kind).ok_or_else(|| {
            SyncError::invalid_argument(format!("Mandate {} has no {} on file", mandate.id, kind.as_str()))
        })?;

        let params = to_params(&ContactDetailsPayload::new(partner_id, kind, address))?;
        let response = self.send(payload::CREATE_CONTACT_DETAILS, params).await?;

        if let Some(remote_id) = success_id(
            payload::CREATE_CONTACT_DETAILS,
            &response,
            &["Kommunikationsverbindung", "KommunikationsverbindungID"],
        )? {
            self.context
                .mandates
                .set_contact_remote_id(mandate.id, kind, &remote_id)
                .await?;
            info!(mandate_id = %mandate.id, kind = kind.as_str(), remote_id = %remote_id, "Created remote contact details");
        }
        Ok(SyncOutcome::Sent(response))
    }

    /// Uploads the mandate document
    pub async fn create_document(&self, mandate: &Mandate) -> Result<SyncOutcome, SyncError> {
        let document = mandate
            .primary_document
            .as_ref()
            .ok_or_else(|| MandateError::MissingDocument(mandate.id.to_string()))?;
        if document.is_synced() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        let partner_id = require_person(mandate)?;

        let params = to_params(&DocumentPayload::new(partner_id, document)?)?;
        let response = self.send(payload::CREATE_DOCUMENT, params).await?;

        if let Some(remote_id) = success_id(payload::CREATE_DOCUMENT, &response, &["Dokument", "DokumentID"])? {
            self.context.mandates.set_document_remote_id(document.id, &remote_id).await?;
            info!(document_id = %document.id, remote_id = %remote_id, "Created remote document");
        }
        Ok(SyncOutcome::Sent(response))
    }

    /// Creates the remote contract for a product
    ///
    /// Unlike the other operations, a success response is checked strictly:
    /// `{"Vertrag": {"VertragID": <number or string>}}` is required.
    pub async fn create_contract(
        &self,
        mandate: &Mandate,
        product: &Product,
    ) -> Result<SyncOutcome, SyncError> {
        if product.is_synced() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        let partner_id = require_person(mandate)?;
        let line = self
            .context
            .lines_of_business
            .lookup(&product.category_ident)
            .ok_or_else(|| {
                SyncError::invalid_argument(format!(
                    "No line of business known for category {}",
                    product.category_ident
                ))
            })?;

        let params = to_params(&ContractPayload::new(partner_id, product, &line))?;
        let response = self.send(payload::CREATE_CONTRACT, params).await?;

        if let Some(response) = response.as_ref().filter(|r| !r.is_error()) {
            let remote_id = contract_id(response)?;
            self.context.products.set_product_remote_id(product.id, &remote_id).await?;
            info!(product_id = %product.id, remote_id = %remote_id, "Created remote contract");
        }
        Ok(SyncOutcome::Sent(response))
    }

    /// Starts the portfolio transfer of a synchronized contract
    ///
    /// On success the product moves to `TransferRequested` and records the
    /// custody pool. A product whose transfer was already requested is not
    /// sent again.
    pub async fn start_transfer(
        &self,
        mandate: &Mandate,
        product: &Product,
    ) -> Result<SyncOutcome, SyncError> {
        if product.transfer_requested() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        let partner_id = require_person(mandate)?;
        let contract_id = product.remote_id.as_ref().ok_or_else(|| {
            SyncError::invalid_argument(format!("Product {} has no remote contract id", product.id))
        })?;

        let params = to_params(&TransferPayload::new(partner_id, contract_id))?;
        let response = self.send(payload::START_TRANSFER, params).await?;

        if response.as_ref().is_some_and(|r| !r.is_error()) {
            let pool = &self.context.settings.custody_pool;
            self.context.products.mark_transfer_requested(product.id, pool).await?;
            info!(product_id = %product.id, pool = %pool, "Started portfolio transfer");
        }
        Ok(SyncOutcome::Sent(response))
    }

    async fn send(&self, method: &str, params: Value) -> Result<Option<RpcResponse>, SyncError> {
        self.context.schemas.validate(method, &params)?;
        debug!(method, "Payload passed schema validation");
        Ok(self.context.transport.call(method, &params).await?)
    }
}

fn require_person(mandate: &Mandate) -> Result<&RemoteId, SyncError> {
    mandate.remote_id.as_ref().ok_or_else(|| {
        SyncError::invalid_argument(format!("Mandate {} has no remote person id", mandate.id))
    })
}

/// Extracts the created id from a successful response
///
/// Returns `None` for faults and application errors.
fn success_id(
    method: &str,
    response: &Option<RpcResponse>,
    path: &[&str],
) -> Result<Option<RemoteId>, SyncError> {
    let Some(response) = response.as_ref().filter(|r| !r.is_error()) else {
        return Ok(None);
    };
    response
        .result_at(path)
        .and_then(RemoteId::from_json)
        .map(Some)
        .ok_or_else(|| SyncError::malformed_response(method, format!("missing {}", path.join("."))))
}

fn contract_id(response: &RpcResponse) -> Result<RemoteId, SyncError> {
    let malformed = |message: &str| SyncError::malformed_response(payload::CREATE_CONTRACT, message);

    let result = response
        .result
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("result is not an object"))?;
    let contract = result
        .get("Vertrag")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("Vertrag is missing or not an object"))?;
    let id = contract
        .get("VertragID")
        .ok_or_else(|| malformed("Vertrag.VertragID is missing"))?;

    match id {
        Value::Number(_) | Value::String(_) => {
            RemoteId::from_json(id).ok_or_else(|| malformed("Vertrag.VertragID is empty"))
        }
        _ => Err(malformed("Vertrag.VertragID is neither a number nor a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_id_accepts_number_and_string() {
        let numeric = RpcResponse::success(json!({"Vertrag": {"VertragID": 42}}));
        assert_eq!(contract_id(&numeric).unwrap(), RemoteId::from(42));

        let textual = RpcResponse::success(json!({"Vertrag": {"VertragID": "42"}}));
        assert_eq!(contract_id(&textual).unwrap(), RemoteId::from(42));
    }

    #[test]
    fn test_contract_id_rejects_bad_shapes() {
        for result in [
            json!([]),
            json!({"Vertrag": 42}),
            json!({"Vertrag": {}}),
            json!({"Vertrag": {"VertragID": {"id": 1}}}),
            json!({"Vertrag": {"VertragID": " "}}),
        ] {
            let error = contract_id(&RpcResponse::success(result.clone())).unwrap_err();
            assert!(matches!(error, SyncError::MalformedResponse { .. }), "{result}");
        }
    }

    #[test]
    fn test_success_id_ignores_errors_and_faults() {
        let error = Some(RpcResponse::failure(infra_rpc::RpcError::new("boom", 1)));
        assert_eq!(success_id("m", &error, &["Person", "PersonID"]).unwrap(), None);
        assert_eq!(success_id("m", &None, &["Person", "PersonID"]).unwrap(), None);
    }

    #[test]
    fn test_success_id_requires_the_id() {
        let response = Some(RpcResponse::success(json!({"Person": {}})));
        assert!(matches!(
            success_id("partner.createPerson", &response, &["Person", "PersonID"]),
            Err(SyncError::MalformedResponse { .. })
        ));
    }
}
