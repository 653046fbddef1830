//! Test Data Builders
//!
//! Provides builder patterns for constructing mandates and products with
//! sensible defaults. Tests specify only the fields they care about.

use chrono::NaiveDate;

use core_kernel::{MandateId, Money, RemoteId};
use domain_mandate::{
    Gender, Insurer, Mandate, MandateDocument, MandateState, PremiumPeriod, Product, ProductState,
};

use crate::fixtures::{MandateFixtures, ProductFixtures};

/// Builder for mandates
pub struct MandateBuilder {
    mandate: Mandate,
}

impl Default for MandateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MandateBuilder {
    /// Starts from [`MandateFixtures::person`]
    pub fn new() -> Self {
        Self {
            mandate: MandateFixtures::person(),
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.mandate.gender = gender;
        self
    }

    pub fn with_names(mut self, first_name: &str, last_name: &str) -> Self {
        self.mandate.first_name = first_name.to_string();
        self.mandate.last_name = last_name.to_string();
        self
    }

    pub fn with_birthdate(mut self, birthdate: Option<NaiveDate>) -> Self {
        self.mandate.birthdate = birthdate;
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.mandate.address.country = country.to_string();
        self
    }

    pub fn with_phone(mut self, phone: Option<&str>) -> Self {
        self.mandate.phone = phone.map(str::to_string);
        self
    }

    pub fn with_email(mut self, email: Option<&str>) -> Self {
        self.mandate.email = email.map(str::to_string);
        self
    }

    pub fn with_state(mut self, state: MandateState) -> Self {
        self.mandate.state = state;
        self
    }

    /// Marks the person as already created remotely
    pub fn with_remote_id(mut self, remote_id: i64) -> Self {
        self.mandate.remote_id = Some(RemoteId::from(remote_id));
        self
    }

    pub fn with_phone_remote_id(mut self, remote_id: i64) -> Self {
        self.mandate.phone_remote_id = Some(RemoteId::from(remote_id));
        self
    }

    pub fn with_email_remote_id(mut self, remote_id: i64) -> Self {
        self.mandate.email_remote_id = Some(RemoteId::from(remote_id));
        self
    }

    pub fn with_document(mut self, document: MandateDocument) -> Self {
        self.mandate.primary_document = Some(document);
        self
    }

    /// Marks the mandate document as already uploaded
    pub fn with_document_remote_id(mut self, remote_id: i64) -> Self {
        if let Some(document) = self.mandate.primary_document.as_mut() {
            document.remote_id = Some(RemoteId::from(remote_id));
        }
        self
    }

    pub fn without_document(mut self) -> Self {
        self.mandate.primary_document = None;
        self
    }

    pub fn build(self) -> Mandate {
        self.mandate
    }
}

/// Builder for products
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    /// Starts from [`ProductFixtures::liability`] for the given mandate
    pub fn new(mandate_id: MandateId) -> Self {
        Self {
            product: ProductFixtures::liability(mandate_id),
        }
    }

    pub fn with_category(mut self, category_ident: &str) -> Self {
        self.product.category_ident = category_ident.to_string();
        self
    }

    pub fn with_insurer(mut self, insurer: Insurer) -> Self {
        self.product.insurer = insurer;
        self
    }

    pub fn with_premium(mut self, premium: Money, period: PremiumPeriod) -> Self {
        self.product.premium = premium;
        self.product.premium_period = period;
        self
    }

    pub fn with_term(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        self.product.contract_started_at = start;
        self.product.contract_ended_at = end;
        self
    }

    pub fn with_state(mut self, state: ProductState) -> Self {
        self.product.state = state;
        self
    }

    /// Marks the contract as already created remotely
    pub fn with_remote_id(mut self, remote_id: i64) -> Self {
        self.product.remote_id = Some(RemoteId::from(remote_id));
        self
    }

    pub fn build(self) -> Product {
        self.product
    }
}
