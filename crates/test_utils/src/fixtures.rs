//! Pre-built Test Fixtures
//!
//! Provides ready-to-use mandates, products and platform responses. The
//! values are consistent and predictable so tests can assert on exact ids.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{MandateId, Money};
use domain_mandate::{
    Address, Gender, InMemorySyncStore, Insurer, Mandate, MandateDocument, PremiumPeriod, Product,
};
use infra_rpc::{RpcError, RpcResponse};

/// Remote ids the happy-path platform hands out
pub struct RemoteIds;

impl RemoteIds {
    pub const PERSON: i64 = 454920238;
    pub const PHONE: i64 = 454920301;
    pub const EMAIL: i64 = 454920302;
    pub const DOCUMENT: i64 = 454920410;
    pub const CONTRACT: i64 = 454920555;
}

/// Fixture for mandate test data
pub struct MandateFixtures;

impl MandateFixtures {
    /// A valid natural person with phone, e-mail and mandate document
    pub fn person() -> Mandate {
        let mut mandate = Mandate::new(
            Gender::Male,
            "Max",
            "Mustermann",
            Address::new("Hauptstr.", "12a", "10115", "Berlin", "DE"),
        );
        mandate.birthdate = NaiveDate::from_ymd_opt(1980, 5, 17);
        mandate.phone = Some("+49 30 1234567".to_string());
        mandate.email = Some("max.mustermann@example.com".to_string());
        mandate.primary_document = Some(Self::document());
        mandate
    }

    /// A valid natural person without a phone number
    pub fn person_without_phone() -> Mandate {
        let mut mandate = Self::person();
        mandate.phone = None;
        mandate
    }

    /// A valid company mandate
    pub fn company() -> Mandate {
        let mut mandate = Mandate::new(
            Gender::Company,
            "Muster",
            "GmbH",
            Address::new("Industriestr.", "5", "80331", "München", "DE"),
        );
        mandate.email = Some("info@muster-gmbh.example".to_string());
        mandate.primary_document = Some(Self::document());
        mandate
    }

    /// A signed mandate PDF
    pub fn document() -> MandateDocument {
        MandateDocument::new("maklerauftrag.pdf", b"%PDF-1.4\n%mandate\n%%EOF".to_vec())
    }
}

/// Fixture for product test data
pub struct ProductFixtures;

impl ProductFixtures {
    /// A yearly private liability contract with a BaFin-registered insurer
    pub fn liability(mandate_id: MandateId) -> Product {
        Product::new(
            mandate_id,
            "liability",
            Self::insurer(),
            "PHV-2020-778899",
            Money::eur(dec!(56.20)),
            PremiumPeriod::Year,
            NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
        )
    }

    pub fn insurer() -> Insurer {
        Insurer {
            name: "Allianz Versicherungs-AG".to_string(),
            bafin_id: Some("5312".to_string()),
            gpid: None,
        }
    }
}

/// Fixture for platform responses
pub struct ResponseFixtures;

impl ResponseFixtures {
    pub fn person_created(id: i64) -> RpcResponse {
        RpcResponse::success(json!({"Person": {"PersonID": id}}))
    }

    pub fn contact_created(id: i64) -> RpcResponse {
        RpcResponse::success(json!({"Kommunikationsverbindung": {"KommunikationsverbindungID": id}}))
    }

    pub fn document_created(id: i64) -> RpcResponse {
        RpcResponse::success(json!({"Dokument": {"DokumentID": id}}))
    }

    pub fn contract_created(id: i64) -> RpcResponse {
        RpcResponse::success(json!({"Vertrag": {"VertragID": id}}))
    }

    pub fn transfer_started(contract_id: i64) -> RpcResponse {
        RpcResponse::success(json!({"Bestandsuebertragung": {"VertragID": contract_id, "Status": "GESTARTET"}}))
    }

    /// An application error with an embedded debug message
    pub fn application_error(message: &str, debug_message: &str) -> RpcResponse {
        RpcResponse::failure(RpcError::new(message, -32602).with_debug_message(debug_message))
    }

    /// The event stream has nothing after the cursor
    pub fn no_event() -> RpcResponse {
        RpcResponse::success(json!({"Ereignis": null}))
    }

    /// A single event of the stream
    pub fn event(event_id: i64, transaction_type: &str, contract_id: i64) -> Value {
        json!({
            "EreignisID": event_id,
            "Geschaeftsvorfall": transaction_type,
            "VertragID": contract_id,
            "PartnerID": RemoteIds::PERSON,
        })
    }

    pub fn event_response(event: Value) -> RpcResponse {
        RpcResponse::success(json!({"Ereignis": event}))
    }
}

/// Creates an in-memory store holding `mandate` and `product`
pub async fn seeded_store(mandate: &Mandate, product: &Product) -> Arc<InMemorySyncStore> {
    let store = Arc::new(InMemorySyncStore::new());
    store.insert_mandate(mandate.clone()).await;
    store.insert_product(product.clone()).await;
    store
}
