//! Mandate Domain
//!
//! Local entities of the brokerage back office as far as the portfolio
//! integration consumes them:
//!
//! - **Mandate**: the customer with address, contact channels and lifecycle
//! - **MandateDocument**: the signed mandate (PDF)
//! - **Product**: an insurance contract to be transferred into the portfolio
//!
//! Each entity carries remote-id markers. A set marker means the entity exists
//! on the portfolio platform; it is the only idempotency marker the
//! integration relies on.
//!
//! # Examples
//!
//! ```rust
//! use domain_mandate::{Address, Gender, Mandate, MandateValidator};
//!
//! let mut mandate = Mandate::new(
//!     Gender::Company,
//!     "Muster",
//!     "GmbH",
//!     Address::new("Hauptstr.", "1", "10115", "Berlin", "DE"),
//! );
//! mandate.email = Some("info@muster.example".to_string());
//!
//! assert!(MandateValidator::validate(&mandate).is_valid);
//! ```

pub mod mandate;
pub mod address;
pub mod document;
pub mod product;
pub mod error;
pub mod validation;
pub mod ports;

pub use mandate::{Mandate, MandateState, Gender, ContactKind};
pub use address::Address;
pub use document::MandateDocument;
pub use product::{Product, ProductState, PremiumPeriod, Insurer};
pub use error::MandateError;
pub use validation::{MandateValidator, ValidationResult};
pub use ports::{MandatePort, ProductPort, SyncLockPort, SyncGuard, LockKey, assign_remote_id};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemorySyncStore;
