//! Tests for the entity sync services

use std::sync::Arc;

use serde_json::json;

use core_kernel::RemoteId;
use domain_mandate::{InMemorySyncStore, Mandate, MandatePort, Product, ProductPort, ProductState};
use domain_transfer::{
    EntitySyncService, SchemaRegistry, StaticLineOfBusinessTable, SyncContext, SyncError,
    SyncOutcome, TransferSettings,
};
use infra_rpc::RpcResponse;
use test_utils::{
    assert_call_count, assert_not_called, seeded_store, MandateBuilder, ProductBuilder,
    RecordingErrorReporter, RemoteIds, ResponseFixtures, ScriptedTransport,
};

struct Harness {
    service: EntitySyncService,
    transport: Arc<ScriptedTransport>,
    store: Arc<InMemorySyncStore>,
}

async fn harness(transport: ScriptedTransport, mandate: &Mandate, product: &Product) -> Harness {
    let transport = Arc::new(transport);
    let store = seeded_store(mandate, product).await;
    let context = SyncContext {
        transport: transport.clone(),
        mandates: store.clone(),
        products: store.clone(),
        locks: store.clone(),
        schemas: Arc::new(SchemaRegistry::new().unwrap()),
        lines_of_business: Arc::new(StaticLineOfBusinessTable::standard()),
        reporter: Arc::new(RecordingErrorReporter::new()),
        settings: TransferSettings {
            custody_pool: "fondsfinanz".to_string(),
        },
    };
    Harness {
        service: EntitySyncService::new(context),
        transport,
        store,
    }
}

// ============================================================================
// create_person
// ============================================================================

mod person_tests {
    use super::*;

    #[tokio::test]
    async fn test_person_id_is_persisted() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new()
            .once("partner.createPerson", ResponseFixtures::person_created(454920238));
        let h = harness(transport, &mandate, &product).await;

        let response = h.service.create_person(&mandate).await.unwrap().into_response().unwrap();

        assert!(!response.is_error());
        let stored = h.store.get_mandate(mandate.id).await.unwrap();
        assert_eq!(stored.remote_id, Some(RemoteId::new("454920238")));
    }

    #[tokio::test]
    async fn test_string_person_id_is_accepted() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new().once(
            "partner.createPerson",
            RpcResponse::success(json!({"Person": {"PersonID": "454920238"}})),
        );
        let h = harness(transport, &mandate, &product).await;

        h.service.create_person(&mandate).await.unwrap();

        let stored = h.store.get_mandate(mandate.id).await.unwrap();
        assert_eq!(stored.remote_id, Some(RemoteId::from(454920238)));
    }

    #[tokio::test]
    async fn test_invalid_mandate_is_never_sent() {
        let mandate = MandateBuilder::new()
            .with_names("", "Mustermann")
            .with_email(None)
            .build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.create_person(&mandate).await.unwrap_err();

        assert!(matches!(error, SyncError::Validation(_)));
        assert_eq!(
            error.to_string(),
            "Mandate validation failed: First name is required; Email is required"
        );
        assert_not_called(&h.transport, "partner.createPerson");
    }

    #[tokio::test]
    async fn test_application_error_leaves_mandate_untouched() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new().once(
            "partner.createPerson",
            ResponseFixtures::application_error("Invalid params", "Postleitzahl unbekannt"),
        );
        let h = harness(transport, &mandate, &product).await;

        let response = h.service.create_person(&mandate).await.unwrap().into_response().unwrap();

        assert_eq!(response.error.unwrap().human_message(), "Postleitzahl unbekannt");
        assert!(h.store.get_mandate(mandate.id).await.unwrap().remote_id.is_none());
    }

    #[tokio::test]
    async fn test_transport_fault_returns_nothing() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new().fault_once("partner.createPerson");
        let h = harness(transport, &mandate, &product).await;

        assert_eq!(h.service.create_person(&mandate).await.unwrap(), SyncOutcome::Sent(None));
        assert!(h.store.get_mandate(mandate.id).await.unwrap().remote_id.is_none());
    }

    #[tokio::test]
    async fn test_person_payload_sent() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        h.service.create_person(&mandate).await.unwrap();

        let payload = &h.transport.calls_to("partner.createPerson")[0];
        assert_eq!(
            payload["PersonDaten"],
            json!({
                "Vorname": "Max",
                "Name": "Mustermann",
                "Anrede": 1,
                "Geschlecht": 1,
                "Geburtsdatum": "1980-05-17"
            })
        );
        assert_eq!(payload["AnschriftDaten"]["Land"], "D");
    }
}

// ============================================================================
// create_contact_details / create_document
// ============================================================================

mod mandate_detail_tests {
    use super::*;

    #[tokio::test]
    async fn test_contact_details_require_person() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.create_contact_details_email(&mandate).await.unwrap_err();

        assert!(matches!(error, SyncError::InvalidArgument(_)));
        assert_not_called(&h.transport, "partner.createKommunikationsverbindung");
    }

    #[tokio::test]
    async fn test_phone_and_email_use_their_type_ids() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        h.service.create_contact_details_phone(&mandate).await.unwrap();
        h.service.create_contact_details_email(&mandate).await.unwrap();

        let calls = h.transport.calls_to("partner.createKommunikationsverbindung");
        assert_eq!(calls[0]["KommunikationsverbindungDaten"]["ArtID"], "21");
        assert_eq!(calls[0]["PartnerID"], RemoteIds::PERSON);
        assert_eq!(calls[1]["KommunikationsverbindungDaten"]["ArtID"], "50");

        let stored = h.store.get_mandate(mandate.id).await.unwrap();
        assert_eq!(stored.phone_remote_id, Some(RemoteId::from(RemoteIds::PHONE)));
        assert_eq!(stored.email_remote_id, Some(RemoteId::from(RemoteIds::EMAIL)));
    }

    #[tokio::test]
    async fn test_document_is_uploaded_compressed() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        h.service.create_document(&mandate).await.unwrap();

        let payload = &h.transport.calls_to("dokument.create")[0];
        let file = &payload["Dokument"]["Datei"];
        assert_eq!(payload["Dokument"]["Dokumenteninformationen"]["Sachgebiet"], "MAKLERAUFTRAG");
        assert_eq!(payload["Dokument"]["Dokumenteninformationen"]["Bezeichnung"], "maklerauftrag.pdf");
        assert_eq!(file["Komprimierungstyp"], "GZIP");
        assert_eq!(file["Pruefsumme"]["Typ"], "SHA1");
        assert_eq!(file["Pruefsumme"]["Wert"].as_str().unwrap().len(), 40);

        let stored = h.store.get_mandate(mandate.id).await.unwrap();
        assert_eq!(
            stored.primary_document.unwrap().remote_id,
            Some(RemoteId::from(RemoteIds::DOCUMENT))
        );
    }

    #[tokio::test]
    async fn test_document_requires_an_attachment() {
        let mandate = MandateBuilder::new()
            .with_remote_id(RemoteIds::PERSON)
            .without_document()
            .build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.create_document(&mandate).await.unwrap_err();
        assert!(matches!(error, SyncError::Validation(_)));
        assert_not_called(&h.transport, "dokument.create");
    }
}

// ============================================================================
// create_contract / start_transfer
// ============================================================================

mod contract_tests {
    use super::*;

    #[tokio::test]
    async fn test_contract_requires_person() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.create_contract(&mandate, &product).await.unwrap_err();
        assert!(matches!(error, SyncError::InvalidArgument(_)));
        assert_not_called(&h.transport, "vertrag.create");
    }

    #[tokio::test]
    async fn test_contract_id_is_persisted() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        h.service.create_contract(&mandate, &product).await.unwrap();

        let payload = &h.transport.calls_to("vertrag.create")[0];
        assert_eq!(payload["VertragDaten"]["Verkaufsprodukt"]["Produkt"]["Sparte"], "040");
        assert_eq!(
            payload["VertragDaten"]["Verkaufsprodukt"]["Produkt"]["Unternehmen"],
            json!({"Nummernart": "BaFin", "Nummer": "5312"})
        );
        let stored = h.store.get_product(product.id).await.unwrap();
        assert_eq!(stored.remote_id, Some(RemoteId::from(RemoteIds::CONTRACT)));
    }

    #[tokio::test]
    async fn test_malformed_contract_result_is_raised() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new().once(
            "vertrag.create",
            RpcResponse::success(json!({"Vertrag": {"Nummer": 1}})),
        );
        let h = harness(transport, &mandate, &product).await;

        let error = h.service.create_contract(&mandate, &product).await.unwrap_err();

        assert!(matches!(error, SyncError::MalformedResponse { .. }));
        assert!(h.store.get_product(product.id).await.unwrap().remote_id.is_none());
    }

    #[tokio::test]
    async fn test_contract_application_error_is_data() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let transport = ScriptedTransport::new().once(
            "vertrag.create",
            ResponseFixtures::application_error("Invalid params", "Versicherungsscheinnummer doppelt"),
        );
        let h = harness(transport, &mandate, &product).await;

        let response = h.service.create_contract(&mandate, &product).await.unwrap().into_response().unwrap();
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).with_category("pets").build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.create_contract(&mandate, &product).await.unwrap_err();
        assert!(matches!(error, SyncError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_start_transfer_requires_contract() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        let error = h.service.start_transfer(&mandate, &product).await.unwrap_err();
        assert!(matches!(error, SyncError::InvalidArgument(_)));
        assert_not_called(&h.transport, "vertrag.startBestandsuebertragung");
    }

    #[tokio::test]
    async fn test_start_transfer_advances_product() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id)
            .with_remote_id(RemoteIds::CONTRACT)
            .build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        h.service.start_transfer(&mandate, &product).await.unwrap();

        assert_call_count(&h.transport, "vertrag.startBestandsuebertragung", 1);
        let stored = h.store.get_product(product.id).await.unwrap();
        assert_eq!(stored.state, ProductState::TransferRequested);
        assert_eq!(stored.managed_by_pool.as_deref(), Some("fondsfinanz"));
    }

    #[tokio::test]
    async fn test_rejected_transfer_keeps_product_state() {
        let mandate = MandateBuilder::new().with_remote_id(RemoteIds::PERSON).build();
        let product = ProductBuilder::new(mandate.id)
            .with_remote_id(RemoteIds::CONTRACT)
            .build();
        let transport = ScriptedTransport::new().once(
            "vertrag.startBestandsuebertragung",
            ResponseFixtures::application_error("Not allowed", "Vertrag bereits im Bestand"),
        );
        let h = harness(transport, &mandate, &product).await;

        h.service.start_transfer(&mandate, &product).await.unwrap();

        let stored = h.store.get_product(product.id).await.unwrap();
        assert_eq!(stored.state, ProductState::DetailsAvailable);
        assert!(stored.managed_by_pool.is_none());
    }
}

// ============================================================================
// Repeated calls
// ============================================================================

mod already_synced_tests {
    use super::*;

    #[tokio::test]
    async fn test_second_call_with_reloaded_entities_is_not_sent() {
        let mandate = MandateBuilder::new().build();
        let product = ProductBuilder::new(mandate.id).build();
        let h = harness(ScriptedTransport::happy_path(), &mandate, &product).await;

        for _ in 0..2 {
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            h.service.create_person(&mandate).await.unwrap();
        }
        for _ in 0..2 {
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            h.service.create_contact_details_phone(&mandate).await.unwrap();
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            h.service.create_contact_details_email(&mandate).await.unwrap();
        }
        for _ in 0..2 {
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            h.service.create_document(&mandate).await.unwrap();
        }
        for _ in 0..2 {
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            let product = h.store.get_product(product.id).await.unwrap();
            h.service.create_contract(&mandate, &product).await.unwrap();
        }
        for _ in 0..2 {
            let mandate = h.store.get_mandate(mandate.id).await.unwrap();
            let product = h.store.get_product(product.id).await.unwrap();
            h.service.start_transfer(&mandate, &product).await.unwrap();
        }

        assert_call_count(&h.transport, "partner.createPerson", 1);
        assert_call_count(&h.transport, "partner.createKommunikationsverbindung", 2);
        assert_call_count(&h.transport, "dokument.create", 1);
        assert_call_count(&h.transport, "vertrag.create", 1);
        assert_call_count(&h.transport, "vertrag.startBestandsuebertragung", 1);
    }

    #[tokio::test]
    async fn test_synced_markers_report_already_synced() {
        let mandate = MandateBuilder::new()
            .with_remote_id(RemoteIds::PERSON)
            .with_phone_remote_id(RemoteIds::PHONE)
            .with_email_remote_id(RemoteIds::EMAIL)
            .with_document_remote_id(RemoteIds::DOCUMENT)
            .build();
        let product = ProductBuilder::new(mandate.id)
            .with_remote_id(RemoteIds::CONTRACT)
            .with_state(ProductState::TransferRequested)
            .build();
        let h = harness(ScriptedTransport::new(), &mandate, &product).await;

        assert!(h.service.create_person(&mandate).await.unwrap().is_already_synced());
        assert!(h.service.create_contact_details_phone(&mandate).await.unwrap().is_already_synced());
        assert!(h.service.create_contact_details_email(&mandate).await.unwrap().is_already_synced());
        assert!(h.service.create_document(&mandate).await.unwrap().is_already_synced());
        assert!(h.service.create_contract(&mandate, &product).await.unwrap().is_already_synced());
        assert!(h.service.start_transfer(&mandate, &product).await.unwrap().is_already_synced());
        assert!(h.transport.calls().is_empty());
    }
}
