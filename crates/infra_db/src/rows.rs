//! Row types and their mapping onto the domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use core_kernel::{Currency, DocumentId, MandateId, Money, ProductId, RemoteId};
use domain_mandate::{
    Address, Gender, Insurer, Mandate, MandateDocument, MandateState, PremiumPeriod, Product,
    ProductState,
};

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct MandateRow {
    pub id: Uuid,
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    pub street: String,
    pub house_number: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub state: String,
    pub remote_id: Option<String>,
    pub phone_remote_id: Option<String>,
    pub email_remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub filename: String,
    pub content: Vec<u8>,
    pub remote_id: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub mandate_id: Uuid,
    pub category_ident: String,
    pub insurer_name: String,
    pub insurer_bafin_id: Option<String>,
    pub insurer_gpid: Option<String>,
    pub policy_number: String,
    pub premium: Decimal,
    pub currency: String,
    pub premium_period: String,
    pub contract_started_at: NaiveDate,
    pub contract_ended_at: Option<NaiveDate>,
    pub state: String,
    pub remote_id: Option<String>,
    pub managed_by_pool: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MANDATE_COLUMNS: &str = "id, gender, first_name, last_name, birthdate, street, \
     house_number, zip_code, city, country, phone, email, state, remote_id, phone_remote_id, \
     email_remote_id, created_at, updated_at";

pub const PRODUCT_COLUMNS: &str = "id, mandate_id, category_ident, insurer_name, \
     insurer_bafin_id, insurer_gpid, policy_number, premium, currency, premium_period, \
     contract_started_at, contract_ended_at, state, remote_id, managed_by_pool, created_at, \
     updated_at";

impl MandateRow {
    /// Builds the domain mandate with its primary document
    pub fn into_mandate(self, document: Option<DocumentRow>) -> Result<Mandate, DatabaseError> {
        let state = MandateState::parse(&self.state)
            .ok_or_else(|| DatabaseError::corrupt(format!("unknown mandate state '{}'", self.state)))?;

        Ok(Mandate {
            id: MandateId::from_uuid(self.id),
            gender: Gender::parse(&self.gender),
            first_name: self.first_name,
            last_name: self.last_name,
            birthdate: self.birthdate,
            address: Address::new(self.street, self.house_number, self.zip_code, self.city, self.country),
            phone: self.phone,
            email: self.email,
            state,
            remote_id: self.remote_id.map(RemoteId::new),
            phone_remote_id: self.phone_remote_id.map(RemoteId::new),
            email_remote_id: self.email_remote_id.map(RemoteId::new),
            primary_document: document.map(DocumentRow::into_document),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DocumentRow {
    pub fn into_document(self) -> MandateDocument {
        MandateDocument {
            id: DocumentId::from_uuid(self.id),
            filename: self.filename,
            content: self.content,
            remote_id: self.remote_id.map(RemoteId::new),
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DatabaseError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .trim()
            .parse()
            .map_err(|_| DatabaseError::corrupt(format!("unknown currency '{}'", row.currency)))?;
        let premium_period = PremiumPeriod::parse(&row.premium_period).ok_or_else(|| {
            DatabaseError::corrupt(format!("unknown premium period '{}'", row.premium_period))
        })?;
        let state = ProductState::parse(&row.state)
            .ok_or_else(|| DatabaseError::corrupt(format!("unknown product state '{}'", row.state)))?;

        Ok(Product {
            id: ProductId::from_uuid(row.id),
            mandate_id: MandateId::from_uuid(row.mandate_id),
            category_ident: row.category_ident,
            insurer: Insurer {
                name: row.insurer_name,
                bafin_id: row.insurer_bafin_id,
                gpid: row.insurer_gpid,
            },
            policy_number: row.policy_number,
            premium: Money::new(row.premium, currency),
            premium_period,
            contract_started_at: row.contract_started_at,
            contract_ended_at: row.contract_ended_at,
            state,
            remote_id: row.remote_id.map(RemoteId::new),
            managed_by_pool: row.managed_by_pool,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_row() -> ProductRow {
        ProductRow {
            id: Uuid::now_v7(),
            mandate_id: Uuid::now_v7(),
            category_ident: "liability".to_string(),
            insurer_name: "Allianz".to_string(),
            insurer_bafin_id: Some("5312".to_string()),
            insurer_gpid: None,
            policy_number: "PHV-1".to_string(),
            premium: Decimal::new(5620, 2),
            currency: "EUR".to_string(),
            premium_period: PremiumPeriod::Year.as_str().to_string(),
            contract_started_at: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
            contract_ended_at: None,
            state: "transfer_requested".to_string(),
            remote_id: Some("454920555".to_string()),
            managed_by_pool: Some("fondsfinanz".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_row_maps() {
        let product = Product::try_from(product_row()).unwrap();

        assert_eq!(product.state, ProductState::TransferRequested);
        assert_eq!(product.remote_id, Some(RemoteId::from(454920555)));
        assert_eq!(product.premium.currency(), Currency::EUR);
    }

    #[test]
    fn test_unknown_state_is_corrupt() {
        let mut row = product_row();
        row.state = "archived".to_string();

        assert!(matches!(Product::try_from(row), Err(DatabaseError::CorruptRow(_))));
    }
}
