//! Address types

use serde::{Deserialize, Serialize};

/// A postal address as kept on the mandate
///
/// `country` is the ISO 3166-1 alpha-2 code ("DE", "AT", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
}

impl Address {
    /// Creates a new address
    pub fn new(
        street: impl Into<String>,
        house_number: impl Into<String>,
        zip_code: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            house_number: house_number.into(),
            zip_code: zip_code.into(),
            city: city.into(),
            country: country.into(),
        }
    }

    /// Formats address for display
    pub fn format(&self) -> String {
        format!(
            "{} {}\n{} {}\n{}",
            self.street, self.house_number, self.zip_code, self.city, self.country
        )
    }
}
