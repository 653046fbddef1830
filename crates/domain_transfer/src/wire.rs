//! Entity wire mapper
//!
//! Pure translation functions between local values and the representations
//! the portfolio platform expects. Nothing in here performs I/O.
//!
//! # Code tables
//!
//! | Local | Wire |
//! |-------|------|
//! | male / female / company | Anrede 1 / 2 / 0 |
//! | male / female | Geschlecht 1 / 2 |
//! | ISO country "DE" | "D" (vehicle registration letters) |
//! | once / year / half year / quarter / month | Zahlungsweise "0" / "1" / "2" / "4" / "12" |

use std::io::Write;

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime};
use flate2::write::GzEncoder;
use flate2::Compression;
use rust_decimal::Decimal;
use serde::Serialize;
use sha1::{Digest, Sha1};

use core_kernel::Money;
use domain_mandate::{Gender, PremiumPeriod};

use crate::error::SyncError;

/// Salutation code, `None` when the gender has no salutation on the platform
pub fn salutation(gender: Gender) -> Option<u8> {
    match gender {
        Gender::Male => Some(1),
        Gender::Female => Some(2),
        Gender::Company => Some(0),
        Gender::Diverse => None,
    }
}

/// Sex code for natural persons
pub fn sex(gender: Gender) -> Option<u8> {
    match gender {
        Gender::Male => Some(1),
        Gender::Female => Some(2),
        Gender::Company | Gender::Diverse => None,
    }
}

/// Maps an ISO 3166-1 alpha-2 code to the platform's country letters
pub fn country_code(iso: &str) -> Option<&'static str> {
    let code = match iso.trim().to_ascii_uppercase().as_str() {
        "DE" => "D",
        "AT" => "A",
        "CH" => "CH",
        "FR" => "F",
        "IT" => "I",
        "NL" => "NL",
        "BE" => "B",
        "LU" => "L",
        "ES" => "E",
        "PL" => "PL",
        "DK" => "DK",
        "GB" => "GB",
        "CZ" => "CZ",
        _ => return None,
    };
    Some(code)
}

/// Payment frequency code
pub fn payment_frequency(period: PremiumPeriod) -> &'static str {
    match period {
        PremiumPeriod::Once => "0",
        PremiumPeriod::Year => "1",
        PremiumPeriod::HalfYear => "2",
        PremiumPeriod::Quarter => "4",
        PremiumPeriod::Month => "12",
    }
}

/// `YYYY-MM-DD`
pub fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM:SS`
pub fn datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Main due date (`MM-DD`) of a contract starting on `start`
pub fn main_due_date(start: NaiveDate) -> String {
    start.format("%m-%d").to_string()
}

/// Monetary amount on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireAmount {
    /// Decimal with exactly two places, e.g. `"56.20"`
    #[serde(rename = "Betrag")]
    pub amount: String,
    #[serde(rename = "Waehrung")]
    pub currency: &'static str,
}

/// Anything that can be sent as an amount; bare decimals are euro
pub trait IntoWireAmount {
    fn into_money(self) -> Money;
}

impl IntoWireAmount for Money {
    fn into_money(self) -> Money {
        self
    }
}

impl IntoWireAmount for Decimal {
    fn into_money(self) -> Money {
        Money::from(self)
    }
}

/// Converts an amount to its wire form
pub fn amount(value: impl IntoWireAmount) -> WireAmount {
    let money = value.into_money().round_to_currency();
    WireAmount {
        amount: format!("{:.2}", money.amount()),
        currency: money.currency().code(),
    }
}

/// A document ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    /// Lowercase hex SHA-1 of the raw bytes
    pub checksum: String,
    /// base64 of the gzip-compressed bytes
    pub data: String,
}

/// Lowercase hex SHA-1 of `bytes`
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Checksums, compresses and encodes a document for upload
///
/// # Errors
///
/// Returns `SyncError::Encoding` if compression fails.
pub fn encode_document(bytes: &[u8]) -> Result<EncodedDocument, SyncError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| SyncError::Encoding(format!("gzip failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SyncError::Encoding(format!("gzip failed: {}", e)))?;

    Ok(EncodedDocument {
        checksum: sha1_hex(bytes),
        data: base64::engine::general_purpose::STANDARD.encode(compressed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use rust_decimal_macros::dec;
    use std::io::Read;

    #[test]
    fn test_gender_codes() {
        assert_eq!(salutation(Gender::Male), Some(1));
        assert_eq!(salutation(Gender::Female), Some(2));
        assert_eq!(salutation(Gender::Company), Some(0));
        assert_eq!(salutation(Gender::Diverse), None);
        assert_eq!(sex(Gender::Company), None);
    }

    #[test]
    fn test_country_codes() {
        assert_eq!(country_code("DE"), Some("D"));
        assert_eq!(country_code("at"), Some("A"));
        assert_eq!(country_code("CH"), Some("CH"));
        assert_eq!(country_code("US"), None);
    }

    #[test]
    fn test_payment_frequency() {
        assert_eq!(payment_frequency(PremiumPeriod::Month), "12");
        assert_eq!(payment_frequency(PremiumPeriod::Quarter), "4");
        assert_eq!(payment_frequency(PremiumPeriod::Once), "0");
    }

    #[test]
    fn test_date_formats() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();
        assert_eq!(date(day), "2021-03-07");
        assert_eq!(main_due_date(day), "03-07");
        assert_eq!(datetime(day.and_hms_opt(9, 5, 0).unwrap()), "2021-03-07T09:05:00");
    }

    #[test]
    fn test_bare_decimal_is_euro() {
        let wire = amount(dec!(56.2));
        assert_eq!(wire.amount, "56.20");
        assert_eq!(wire.currency, "EUR");
    }

    #[test]
    fn test_amount_is_rounded_to_cents() {
        let wire = amount(Money::new(dec!(10.005), core_kernel::Currency::CHF));
        assert_eq!(wire.amount, "10.00");
        assert_eq!(wire.currency, "CHF");
    }

    #[test]
    fn test_sha1_hex() {
        assert_eq!(sha1_hex(b"%PDF-1.4 test"), "aad40d63bba893303d27183eb955d53a0284007b");
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_encoded_document_decodes_to_original() {
        let raw = b"%PDF-1.4 test".to_vec();
        let encoded = encode_document(&raw).unwrap();

        let compressed = base64::engine::general_purpose::STANDARD
            .decode(&encoded.data)
            .unwrap();
        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();

        assert_eq!(decoded, raw);
        assert_eq!(encoded.checksum, sha1_hex(&raw));
    }
}
