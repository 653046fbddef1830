//! Product (insurance contract) entity
//!
//! A product is an existing insurance contract of a mandate that the brokerage
//! wants to take over into its portfolio. Pushing it to the platform creates
//! the remote contract; starting the transfer hands custody to the pool.
//!
//! # Lifecycle
//!
//! ```text
//! DetailsAvailable -> TransferRequested -> UnderManagement
//!                                      \-> TransferDenied
//! UnderManagement  -> Terminated
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{MandateId, Money, ProductId, RemoteId};

/// Lifecycle state of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductState {
    DetailsAvailable,
    TransferRequested,
    UnderManagement,
    TransferDenied,
    Terminated,
}

impl ProductState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductState::DetailsAvailable => "details_available",
            ProductState::TransferRequested => "transfer_requested",
            ProductState::UnderManagement => "under_management",
            ProductState::TransferDenied => "transfer_denied",
            ProductState::Terminated => "terminated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "details_available" => Some(ProductState::DetailsAvailable),
            "transfer_requested" => Some(ProductState::TransferRequested),
            "under_management" => Some(ProductState::UnderManagement),
            "transfer_denied" => Some(ProductState::TransferDenied),
            "terminated" => Some(ProductState::Terminated),
            _ => None,
        }
    }

    /// Whether the portfolio transfer has been started (or went further)
    pub fn transfer_started(&self) -> bool {
        !matches!(self, ProductState::DetailsAvailable)
    }

    /// Checks whether the transition to `next` is allowed
    pub fn can_transition_to(&self, next: ProductState) -> bool {
        use ProductState::*;
        matches!(
            (self, next),
            (DetailsAvailable, TransferRequested)
                | (TransferRequested, UnderManagement)
                | (TransferRequested, TransferDenied)
                | (UnderManagement, Terminated)
                | (TransferRequested, Terminated)
        )
    }
}

impl std::fmt::Display for ProductState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the premium is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumPeriod {
    Once,
    Year,
    HalfYear,
    Quarter,
    Month,
}

impl PremiumPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PremiumPeriod::Once => "once",
            PremiumPeriod::Year => "year",
            PremiumPeriod::HalfYear => "half_year",
            PremiumPeriod::Quarter => "quarter",
            PremiumPeriod::Month => "month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "once" => Some(PremiumPeriod::Once),
            "year" => Some(PremiumPeriod::Year),
            "half_year" => Some(PremiumPeriod::HalfYear),
            "quarter" => Some(PremiumPeriod::Quarter),
            "month" => Some(PremiumPeriod::Month),
            _ => None,
        }
    }
}

/// The insurance company carrying the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurer {
    pub name: String,
    /// Registration number at the German financial supervisory authority
    pub bafin_id: Option<String>,
    /// Pool-wide company number, used when no BaFin number is known
    pub gpid: Option<String>,
}

/// An insurance contract of a mandate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub mandate_id: MandateId,
    /// Identifier of the insurance category (e.g. "liability", "household")
    pub category_ident: String,
    pub insurer: Insurer,
    pub policy_number: String,
    pub premium: Money,
    pub premium_period: PremiumPeriod,
    pub contract_started_at: NaiveDate,
    pub contract_ended_at: Option<NaiveDate>,
    pub state: ProductState,
    /// Remote contract id
    pub remote_id: Option<RemoteId>,
    /// Custody pool managing the contract once the transfer was requested
    pub managed_by_pool: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product in the `DetailsAvailable` state
    pub fn new(
        mandate_id: MandateId,
        category_ident: impl Into<String>,
        insurer: Insurer,
        policy_number: impl Into<String>,
        premium: Money,
        premium_period: PremiumPeriod,
        contract_started_at: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new_v7(),
            mandate_id,
            category_ident: category_ident.into(),
            insurer,
            policy_number: policy_number.into(),
            premium,
            premium_period,
            contract_started_at,
            contract_ended_at: None,
            state: ProductState::DetailsAvailable,
            remote_id: None,
            managed_by_pool: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the contract exists on the platform
    pub fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Whether the portfolio transfer was already started
    pub fn transfer_requested(&self) -> bool {
        self.state.transfer_started() || self.managed_by_pool.is_some()
    }
}
