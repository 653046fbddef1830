//! Tests for domain_mandate

use chrono::{Days, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{MandateId, Money, RemoteId};

use domain_mandate::{
    Address, ContactKind, Gender, Insurer, Mandate, MandateDocument, MandateState,
    MandateValidator, PremiumPeriod, Product, ProductState, LockKey,
};

fn create_test_mandate() -> Mandate {
    let mut mandate = Mandate::new(
        Gender::Female,
        "Erika",
        "Mustermann",
        Address::new("Heidestr.", "17", "51147", "Köln", "DE"),
    );
    mandate.birthdate = NaiveDate::from_ymd_opt(1964, 8, 12);
    mandate.email = Some("erika@example.com".to_string());
    mandate.phone = Some("+49 221 123456".to_string());
    mandate.primary_document = Some(MandateDocument::new("mandate.pdf", b"%PDF-1.4".to_vec()));
    mandate
}

fn create_test_product(mandate_id: MandateId) -> Product {
    Product::new(
        mandate_id,
        "liability",
        Insurer {
            name: "Allianz".to_string(),
            bafin_id: Some("5312".to_string()),
            gpid: None,
        },
        "LV-123456",
        Money::eur(dec!(56.20)),
        PremiumPeriod::Year,
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    )
}

// ============================================================================
// Mandate Tests
// ============================================================================

mod mandate_tests {
    use super::*;

    #[test]
    fn test_contact_markers_are_independent() {
        let mut mandate = create_test_mandate();
        mandate.email_remote_id = Some(RemoteId::from(77));

        assert_eq!(mandate.contact_remote_id(ContactKind::Email), Some(&RemoteId::from(77)));
        assert_eq!(mandate.contact_remote_id(ContactKind::Phone), None);
        assert_eq!(mandate.contact(ContactKind::Email), Some("erika@example.com"));
    }

    #[test]
    fn test_mandate_serializes_state_snake_case() {
        let mut mandate = create_test_mandate();
        mandate.state = MandateState::InCreation;
        let json = serde_json::to_value(&mandate).unwrap();
        assert_eq!(json["state"], "in_creation");
        assert_eq!(json["gender"], "female");
    }

    #[test]
    fn test_document_is_synced_once_marked() {
        let mut document = MandateDocument::new("mandate.pdf", vec![1, 2, 3]);
        assert!(!document.is_synced());
        document.remote_id = Some(RemoteId::from(454920239));
        assert!(document.is_synced());
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_person() {
        let result = MandateValidator::validate(&create_test_mandate());
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_future_birthdate_is_rejected() {
        let mut mandate = create_test_mandate();
        mandate.birthdate = Utc::now().date_naive().checked_add_days(Days::new(1));

        let result = MandateValidator::validate(&mandate);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("past")));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut mandate = create_test_mandate();
        mandate.email = Some("not-an-address".to_string());
        assert!(!MandateValidator::validate(&mandate).is_valid);
    }

    #[test]
    fn test_unusual_zip_is_warning_only() {
        let mut mandate = create_test_mandate();
        mandate.address.zip_code = "1234".to_string();

        let result = MandateValidator::validate(&mandate);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_three_letter_country_is_rejected() {
        let mut mandate = create_test_mandate();
        mandate.address.country = "DEU".to_string();
        assert!(!MandateValidator::validate(&mandate).is_valid);
    }
}

// ============================================================================
// Product Tests
// ============================================================================

mod product_tests {
    use super::*;

    #[test]
    fn test_new_product() {
        let mandate = create_test_mandate();
        let product = create_test_product(mandate.id);

        assert_eq!(product.state, ProductState::DetailsAvailable);
        assert!(!product.is_synced());
        assert!(!product.transfer_requested());
        assert_eq!(product.premium.amount(), dec!(56.20));
    }

    #[test]
    fn test_pool_marks_transfer_requested() {
        let mut product = create_test_product(MandateId::new());
        product.managed_by_pool = Some("fondsfinanz".to_string());
        assert!(product.transfer_requested());
    }

    #[test]
    fn test_lock_keys_are_scoped_by_entity() {
        let mandate = create_test_mandate();
        let product = create_test_product(mandate.id);

        let mandate_key = LockKey::Mandate(mandate.id);
        let product_key = LockKey::Product(product.id);
        assert_ne!(mandate_key.as_string(), product_key.as_string());
        assert!(mandate_key.to_string().starts_with("mandate:"));
    }

    fn any_state() -> impl Strategy<Value = ProductState> {
        prop_oneof![
            Just(ProductState::DetailsAvailable),
            Just(ProductState::TransferRequested),
            Just(ProductState::UnderManagement),
            Just(ProductState::TransferDenied),
            Just(ProductState::Terminated),
        ]
    }

    proptest! {
        #[test]
        fn prop_no_transition_returns_to_details(from in any_state()) {
            prop_assert!(!from.can_transition_to(ProductState::DetailsAvailable));
        }

        #[test]
        fn prop_terminal_states_have_no_exit(to in any_state()) {
            prop_assert!(!ProductState::Terminated.can_transition_to(to));
            prop_assert!(!ProductState::TransferDenied.can_transition_to(to));
        }

        #[test]
        fn prop_state_parse_roundtrip(state in any_state()) {
            prop_assert_eq!(ProductState::parse(state.as_str()), Some(state));
        }
    }
}
