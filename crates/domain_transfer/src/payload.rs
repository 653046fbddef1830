//! Typed request payloads, one per RPC method
//!
//! Each payload is built from local entities through the [`wire`](crate::wire)
//! functions and serialized to the exact field names of the platform. Values
//! without a wire mapping are left out, so the schema check rejects them
//! before anything is sent.

use serde::Serialize;
use serde_json::Value;

use core_kernel::RemoteId;
use domain_mandate::{ContactKind, Mandate, MandateDocument, Product};

use crate::error::SyncError;
use crate::lob::LineOfBusiness;
use crate::wire::{self, WireAmount};

pub const CREATE_PERSON: &str = "partner.createPerson";
pub const CREATE_CONTACT_DETAILS: &str = "partner.createKommunikationsverbindung";
pub const CREATE_DOCUMENT: &str = "dokument.create";
pub const CREATE_CONTRACT: &str = "vertrag.create";
pub const START_TRANSFER: &str = "vertrag.startBestandsuebertragung";
pub const PULL_EVENT: &str = "ereignis.getNext";

/// Document category of the signed brokerage mandate
pub const MANDATE_DOCUMENT_CATEGORY: &str = "MAKLERAUFTRAG";

/// Communication channel type: phone
pub const CONTACT_TYPE_PHONE: &str = "21";
/// Communication channel type: e-mail
pub const CONTACT_TYPE_EMAIL: &str = "50";

/// Serializes a payload into RPC params
pub fn to_params<T: Serialize>(payload: &T) -> Result<Value, SyncError> {
    serde_json::to_value(payload).map_err(|e| SyncError::Encoding(e.to_string()))
}

// ============================================================================
// partner.createPerson
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonPayload {
    #[serde(rename = "PersonDaten")]
    pub person: PersonData,
    #[serde(rename = "AnschriftDaten")]
    pub address: AddressData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonData {
    #[serde(rename = "Vorname")]
    pub first_name: String,
    #[serde(rename = "Name")]
    pub last_name: String,
    #[serde(rename = "Anrede", skip_serializing_if = "Option::is_none")]
    pub salutation: Option<u8>,
    #[serde(rename = "Geschlecht", skip_serializing_if = "Option::is_none")]
    pub sex: Option<u8>,
    #[serde(rename = "Geburtsdatum", skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressData {
    #[serde(rename = "Strasse")]
    pub street: String,
    #[serde(rename = "Hausnummer")]
    pub house_number: String,
    #[serde(rename = "Ort")]
    pub city: String,
    #[serde(rename = "Postleitzahl")]
    pub zip_code: String,
    #[serde(rename = "Land", skip_serializing_if = "Option::is_none")]
    pub country: Option<&'static str>,
}

impl PersonPayload {
    pub fn from_mandate(mandate: &Mandate) -> Self {
        let address = &mandate.address;
        Self {
            person: PersonData {
                first_name: mandate.first_name.trim().to_string(),
                last_name: mandate.last_name.trim().to_string(),
                salutation: wire::salutation(mandate.gender),
                sex: wire::sex(mandate.gender),
                birthdate: mandate.birthdate.map(wire::date),
            },
            address: AddressData {
                street: address.street.trim().to_string(),
                house_number: address.house_number.trim().to_string(),
                city: address.city.trim().to_string(),
                zip_code: address.zip_code.trim().to_string(),
                country: wire::country_code(&address.country),
            },
        }
    }
}

// ============================================================================
// partner.createKommunikationsverbindung
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetailsPayload {
    #[serde(rename = "PartnerID")]
    pub partner_id: Value,
    #[serde(rename = "KommunikationsverbindungDaten")]
    pub details: ContactDetailsData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetailsData {
    #[serde(rename = "Kommunikationsadresse")]
    pub address: String,
    #[serde(rename = "ArtID")]
    pub kind: &'static str,
}

impl ContactDetailsPayload {
    pub fn new(partner_id: &RemoteId, kind: ContactKind, address: &str) -> Self {
        let kind = match kind {
            ContactKind::Phone => CONTACT_TYPE_PHONE,
            ContactKind::Email => CONTACT_TYPE_EMAIL,
        };
        Self {
            partner_id: partner_id.to_json(),
            details: ContactDetailsData {
                address: address.trim().to_string(),
                kind,
            },
        }
    }
}

// ============================================================================
// dokument.create
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPayload {
    #[serde(rename = "PartnerID")]
    pub partner_id: Value,
    #[serde(rename = "Dokument")]
    pub document: DocumentData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentData {
    #[serde(rename = "Dokumenteninformationen")]
    pub info: DocumentInfo,
    #[serde(rename = "Datei")]
    pub file: DocumentFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    #[serde(rename = "Sachgebiet")]
    pub category: &'static str,
    #[serde(rename = "Bezeichnung")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFile {
    #[serde(rename = "Dateiformat")]
    pub format: &'static str,
    #[serde(rename = "Komprimierungstyp")]
    pub compression: &'static str,
    #[serde(rename = "Pruefsumme")]
    pub checksum: Checksum,
    #[serde(rename = "Daten")]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checksum {
    #[serde(rename = "Typ")]
    pub algorithm: &'static str,
    #[serde(rename = "Wert")]
    pub value: String,
}

impl DocumentPayload {
    /// Encodes the document content and builds the payload
    pub fn new(partner_id: &RemoteId, document: &MandateDocument) -> Result<Self, SyncError> {
        let encoded = wire::encode_document(&document.content)?;
        Ok(Self {
            partner_id: partner_id.to_json(),
            document: DocumentData {
                info: DocumentInfo {
                    category: MANDATE_DOCUMENT_CATEGORY,
                    name: document.filename.clone(),
                },
                file: DocumentFile {
                    format: "PDF",
                    compression: "GZIP",
                    checksum: Checksum {
                        algorithm: "SHA1",
                        value: encoded.checksum,
                    },
                    data: encoded.data,
                },
            },
        })
    }
}

// ============================================================================
// vertrag.create
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractPayload {
    #[serde(rename = "PartnerID")]
    pub partner_id: Value,
    #[serde(rename = "VertragDaten")]
    pub contract: ContractData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractData {
    #[serde(rename = "Hauptfaelligkeit")]
    pub main_due_date: String,
    #[serde(rename = "Vertragsstatus")]
    pub status: &'static str,
    #[serde(rename = "Zahlungsweise")]
    pub payment_frequency: &'static str,
    #[serde(rename = "Vertragsnummer")]
    pub number: ContractNumber,
    #[serde(rename = "Verkaufsprodukt")]
    pub sales_product: SalesProduct,
    #[serde(rename = "Beitrag")]
    pub premium: Premium,
    #[serde(rename = "Versicherungsdauer")]
    pub term: ContractTerm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractNumber {
    #[serde(rename = "Versicherungsscheinnummer")]
    pub policy_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesProduct {
    #[serde(rename = "Produkt")]
    pub product: ProductClassification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductClassification {
    #[serde(rename = "Typ")]
    pub product_type: String,
    #[serde(rename = "Sparte")]
    pub line: String,
    #[serde(rename = "Unternehmen", skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyNumber {
    #[serde(rename = "Nummernart")]
    pub kind: &'static str,
    #[serde(rename = "Nummer")]
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Premium {
    #[serde(rename = "ArtID")]
    pub kind: &'static str,
    #[serde(rename = "Betrag")]
    pub amount: WireAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractTerm {
    #[serde(rename = "Beginn")]
    pub start: String,
    #[serde(rename = "Ende", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Active contract
const CONTRACT_STATUS_ACTIVE: &str = "1";
/// Regular premium
const PREMIUM_KIND_REGULAR: &str = "1";

impl ContractPayload {
    pub fn new(partner_id: &RemoteId, product: &Product, line: &LineOfBusiness) -> Self {
        let insurer = &product.insurer;
        let company = match (&insurer.bafin_id, &insurer.gpid) {
            (Some(bafin), _) if !bafin.trim().is_empty() => Some(CompanyNumber {
                kind: "BaFin",
                number: bafin.trim().to_string(),
            }),
            (_, Some(gpid)) if !gpid.trim().is_empty() => Some(CompanyNumber {
                kind: "GPID",
                number: gpid.trim().to_string(),
            }),
            _ => None,
        };

        Self {
            partner_id: partner_id.to_json(),
            contract: ContractData {
                main_due_date: wire::main_due_date(product.contract_started_at),
                status: CONTRACT_STATUS_ACTIVE,
                payment_frequency: wire::payment_frequency(product.premium_period),
                number: ContractNumber {
                    policy_number: product.policy_number.trim().to_string(),
                },
                sales_product: SalesProduct {
                    product: ProductClassification {
                        product_type: line.product_type.clone(),
                        line: line.line.clone(),
                        company,
                    },
                },
                premium: Premium {
                    kind: PREMIUM_KIND_REGULAR,
                    amount: wire::amount(product.premium),
                },
                term: ContractTerm {
                    start: wire::date(product.contract_started_at),
                    end: product.contract_ended_at.map(wire::date),
                },
            },
        }
    }
}

// ============================================================================
// vertrag.startBestandsuebertragung
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferPayload {
    #[serde(rename = "PartnerID")]
    pub partner_id: Value,
    #[serde(rename = "VertragID")]
    pub contract_id: Value,
}

impl TransferPayload {
    pub fn new(partner_id: &RemoteId, contract_id: &RemoteId) -> Self {
        Self {
            partner_id: partner_id.to_json(),
            contract_id: contract_id.to_json(),
        }
    }
}

// ============================================================================
// ereignis.getNext
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPullPayload {
    /// Last processed event, 0 when none
    #[serde(rename = "EreignisID")]
    pub cursor: i64,
    /// Contract whose stream is read
    #[serde(rename = "VertragID", skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<Value>,
}

impl EventPullPayload {
    pub fn new(cursor: i64, contract_id: Option<&RemoteId>) -> Self {
        Self {
            cursor,
            contract_id: contract_id.map(RemoteId::to_json),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{MandateId, Money};
    use domain_mandate::{Address, Gender, Insurer, PremiumPeriod};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product() -> Product {
        let mut product = Product::new(
            MandateId::new(),
            "liability",
            Insurer {
                name: "Allianz".to_string(),
                bafin_id: None,
                gpid: Some("GP-1234".to_string()),
            },
            "LV-123456",
            Money::eur(dec!(56.2)),
            PremiumPeriod::Month,
            NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
        );
        product.contract_ended_at = NaiveDate::from_ymd_opt(2030, 3, 31);
        product
    }

    #[test]
    fn test_company_person_has_no_birthdate_or_sex() {
        let mandate = Mandate::new(
            Gender::Company,
            "Muster",
            "GmbH",
            Address::new("Hauptstr.", "1", "10115", "Berlin", "DE"),
        );
        let params = to_params(&PersonPayload::from_mandate(&mandate)).unwrap();

        assert_eq!(
            params,
            json!({
                "PersonDaten": {"Vorname": "Muster", "Name": "GmbH", "Anrede": 0},
                "AnschriftDaten": {
                    "Strasse": "Hauptstr.",
                    "Hausnummer": "1",
                    "Ort": "Berlin",
                    "Postleitzahl": "10115",
                    "Land": "D"
                }
            })
        );
    }

    #[test]
    fn test_contact_details_payload() {
        let payload = ContactDetailsPayload::new(&RemoteId::from(454920238), ContactKind::Email, " a@b.de ");
        assert_eq!(
            to_params(&payload).unwrap(),
            json!({
                "PartnerID": 454920238,
                "KommunikationsverbindungDaten": {"Kommunikationsadresse": "a@b.de", "ArtID": "50"}
            })
        );
    }

    #[test]
    fn test_contract_payload_falls_back_to_gpid() {
        let params = to_params(&ContractPayload::new(
            &RemoteId::from(1),
            &product(),
            &LineOfBusiness::new("PHV", "040"),
        ))
        .unwrap();

        let contract = &params["VertragDaten"];
        assert_eq!(contract["Hauptfaelligkeit"], "04-01");
        assert_eq!(contract["Zahlungsweise"], "12");
        assert_eq!(contract["Beitrag"]["Betrag"], json!({"Betrag": "56.20", "Waehrung": "EUR"}));
        assert_eq!(
            contract["Verkaufsprodukt"]["Produkt"]["Unternehmen"],
            json!({"Nummernart": "GPID", "Nummer": "GP-1234"})
        );
        assert_eq!(contract["Versicherungsdauer"]["Ende"], "2030-03-31");
    }

    #[test]
    fn test_contract_without_end_omits_ende() {
        let mut product = product();
        product.contract_ended_at = None;
        product.insurer.bafin_id = Some("5312".to_string());

        let params = to_params(&ContractPayload::new(
            &RemoteId::from(1),
            &product,
            &LineOfBusiness::new("PHV", "040"),
        ))
        .unwrap();

        let term = params["VertragDaten"]["Versicherungsdauer"].as_object().unwrap();
        assert!(!term.contains_key("Ende"));
        assert_eq!(
            params["VertragDaten"]["Verkaufsprodukt"]["Produkt"]["Unternehmen"]["Nummernart"],
            "BaFin"
        );
    }

    #[test]
    fn test_event_pull_payload() {
        assert_eq!(to_params(&EventPullPayload::new(0, None)).unwrap(), json!({"EreignisID": 0}));
        assert_eq!(
            to_params(&EventPullPayload::new(7, Some(&RemoteId::from(99)))).unwrap(),
            json!({"EreignisID": 7, "VertragID": 99})
        );
    }
}
