//! Every payload built from valid entities satisfies the platform schema

use std::sync::OnceLock;

use proptest::prelude::*;

use core_kernel::{MandateId, RemoteId};
use domain_mandate::{ContactKind, Gender, MandateValidator};
use domain_transfer::payload::{
    self, to_params, ContactDetailsPayload, ContractPayload, DocumentPayload, EventPullPayload,
    PersonPayload, TransferPayload,
};
use domain_transfer::{LineOfBusinessLookup, SchemaRegistry, StaticLineOfBusinessTable, SyncError};
use test_utils::{product_strategy, valid_mandate_strategy, MandateBuilder};

fn schemas() -> &'static SchemaRegistry {
    static SCHEMAS: OnceLock<SchemaRegistry> = OnceLock::new();
    SCHEMAS.get_or_init(|| SchemaRegistry::new().unwrap())
}

fn partner() -> RemoteId {
    RemoteId::from(454920238)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_person_payload_matches_schema(mandate in valid_mandate_strategy()) {
        prop_assert!(MandateValidator::validate(&mandate).is_valid);

        let params = to_params(&PersonPayload::from_mandate(&mandate)).unwrap();
        prop_assert!(schemas().validate(payload::CREATE_PERSON, &params).is_ok(), "{}", params);
    }

    #[test]
    fn prop_contact_payloads_match_schema(mandate in valid_mandate_strategy()) {
        for kind in [ContactKind::Phone, ContactKind::Email] {
            if let Some(address) = mandate.contact(kind) {
                let params = to_params(&ContactDetailsPayload::new(&partner(), kind, address)).unwrap();
                prop_assert!(schemas().validate(payload::CREATE_CONTACT_DETAILS, &params).is_ok(), "{}", params);
            }
        }
    }

    #[test]
    fn prop_document_payload_matches_schema(mandate in valid_mandate_strategy()) {
        let document = mandate.primary_document.as_ref().unwrap();
        let params = to_params(&DocumentPayload::new(&partner(), document).unwrap()).unwrap();
        prop_assert!(schemas().validate(payload::CREATE_DOCUMENT, &params).is_ok());
    }

    #[test]
    fn prop_contract_payload_matches_schema(product in product_strategy(MandateId::new())) {
        let line = StaticLineOfBusinessTable::standard()
            .lookup(&product.category_ident)
            .unwrap();
        let params = to_params(&ContractPayload::new(&partner(), &product, &line)).unwrap();
        prop_assert!(schemas().validate(payload::CREATE_CONTRACT, &params).is_ok(), "{}", params);
    }

    #[test]
    fn prop_event_pull_payload_matches_schema(cursor in 0i64..i64::MAX, contract in prop::option::of(1i64..1_000_000_000)) {
        let contract = contract.map(RemoteId::from);
        let params = to_params(&EventPullPayload::new(cursor, contract.as_ref())).unwrap();
        prop_assert!(schemas().validate(payload::PULL_EVENT, &params).is_ok());
    }
}

#[test]
fn test_transfer_payload_matches_schema() {
    let params = to_params(&TransferPayload::new(&partner(), &RemoteId::from(454920555))).unwrap();
    assert!(schemas().validate(payload::START_TRANSFER, &params).is_ok());
}

#[test]
fn test_unmapped_salutation_fails_schema() {
    let mandate = MandateBuilder::new().with_gender(Gender::Diverse).build();
    let params = to_params(&PersonPayload::from_mandate(&mandate)).unwrap();

    let error = schemas().validate(payload::CREATE_PERSON, &params).unwrap_err();
    assert!(matches!(error, SyncError::Schema { .. }));
}

#[test]
fn test_unmapped_country_fails_schema() {
    let mandate = MandateBuilder::new().with_country("US").build();
    let params = to_params(&PersonPayload::from_mandate(&mandate)).unwrap();

    assert!(params["AnschriftDaten"].get("Land").is_none());
    assert!(schemas().validate(payload::CREATE_PERSON, &params).is_err());
}
