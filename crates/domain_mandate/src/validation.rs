//! Mandate validation rules
//!
//! A mandate must pass these checks before its person record may be created
//! on the portfolio platform.
//!
//! # Validation Rules
//!
//! ## All mandates
//! - First and last name are required
//! - Street, house number, zip code and city are required
//! - Country must be a 2-letter ISO code
//! - An e-mail address is required and must look like one
//! - A phone number, if given, must contain digits
//!
//! ## Natural persons
//! - Gender must have a salutation on the platform (male/female)
//! - Date of birth is required and must be in the past
//!
//! ## Companies
//! - No date of birth is required

use chrono::Utc;

use crate::mandate::{Gender, Mandate};
use crate::error::MandateError;

/// Result of mandate validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the mandate is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Adds a warning to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Converts the result into an error carrying all messages
    pub fn into_result(self) -> Result<(), MandateError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(MandateError::validation_failed(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for mandates
///
/// # Examples
///
/// ```rust,ignore
/// use domain_mandate::validation::MandateValidator;
///
/// let result = MandateValidator::validate(&mandate);
/// if !result.is_valid {
///     for error in result.errors {
///         println!("Validation error: {}", error);
///     }
/// }
/// ```
pub struct MandateValidator;

impl MandateValidator {
    /// Validates a mandate
    pub fn validate(mandate: &Mandate) -> ValidationResult {
        let mut result = ValidationResult::ok();

        Self::validate_name(mandate, &mut result);
        Self::validate_address(mandate, &mut result);
        Self::validate_contact(mandate, &mut result);

        match mandate.gender {
            Gender::Male | Gender::Female => Self::validate_person(mandate, &mut result),
            Gender::Company => {}
            Gender::Diverse => {
                result.add_error("Gender has no salutation on the portfolio platform");
            }
        }

        result
    }

    fn validate_name(mandate: &Mandate, result: &mut ValidationResult) {
        if mandate.first_name.trim().is_empty() {
            result.add_error("First name is required");
        }
        if mandate.last_name.trim().is_empty() {
            result.add_error("Last name is required");
        }
    }

    fn validate_address(mandate: &Mandate, result: &mut ValidationResult) {
        let address = &mandate.address;
        if address.street.trim().is_empty() {
            result.add_error("Street is required");
        }
        if address.house_number.trim().is_empty() {
            result.add_error("House number is required");
        }
        if address.zip_code.trim().is_empty() {
            result.add_error("Zip code is required");
        }
        if address.city.trim().is_empty() {
            result.add_error("City is required");
        }
        if address.country.len() != 2 {
            result.add_error("Country must be a 2-letter ISO code");
        }
        if address.country == "DE"
            && (address.zip_code.len() != 5 || !address.zip_code.chars().all(|c| c.is_ascii_digit()))
        {
            result.add_warning(format!("Unusual German zip code: {}", address.zip_code));
        }
    }

    fn validate_contact(mandate: &Mandate, result: &mut ValidationResult) {
        match mandate.usable_email() {
            Some(email) if email.contains('@') && email.contains('.') => {}
            Some(email) => result.add_error(format!("Invalid email format: {}", email)),
            None => result.add_error("Email is required"),
        }

        if let Some(phone) = mandate.usable_phone() {
            if !phone.chars().any(|c| c.is_ascii_digit()) {
                result.add_error(format!("Invalid phone number: {}", phone));
            }
        }
    }

    fn validate_person(mandate: &Mandate, result: &mut ValidationResult) {
        match mandate.birthdate {
            Some(birthdate) if birthdate >= Utc::now().date_naive() => {
                result.add_error("Date of birth must be in the past");
            }
            Some(_) => {}
            None => result.add_error("Date of birth is required"),
        }
    }
}
