//! Mandate entity
//!
//! A mandate is the brokerage's customer record: the person (or company) who
//! signed a brokerage mandate, with their contact data and the signed mandate
//! document. The portfolio integration reads a handful of its fields and owns
//! the remote-id markers recorded on it.
//!
//! # Lifecycle
//!
//! ```text
//! InCreation -> Created -> Accepted
//!                  \           \-> Revoked
//!                   \-> Rejected
//! ```
//!
//! Only `Created` and `Accepted` mandates may be pushed to the portfolio
//! platform.
//!
//! # Remote markers
//!
//! Each remote concept created for the mandate has its own marker:
//!
//! - `remote_id`: the remote person
//! - `phone_remote_id` / `email_remote_id`: the remote communication channels
//! - `primary_document.remote_id`: the remote mandate document
//!
//! A marker that is set is never cleared or reassigned.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{MandateId, RemoteId};
use crate::address::Address;
use crate::document::MandateDocument;

/// Gender / legal form as captured on the mandate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    /// The mandate was signed for a company
    Company,
    /// Any other value; has no salutation on the platform
    Diverse,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Company => "company",
            Gender::Diverse => "diverse",
        }
    }

    /// Parses the persisted representation; unknown values are `Diverse`
    pub fn parse(value: &str) -> Self {
        match value {
            "male" => Gender::Male,
            "female" => Gender::Female,
            "company" => Gender::Company,
            _ => Gender::Diverse,
        }
    }
}

/// Lifecycle state of a mandate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateState {
    InCreation,
    Created,
    Accepted,
    Revoked,
    Rejected,
}

impl MandateState {
    /// Whether a mandate in this state may be synchronized with the platform
    pub fn is_syncable(&self) -> bool {
        matches!(self, MandateState::Created | MandateState::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MandateState::InCreation => "in_creation",
            MandateState::Created => "created",
            MandateState::Accepted => "accepted",
            MandateState::Revoked => "revoked",
            MandateState::Rejected => "rejected",
        }
    }

    /// Parses the persisted representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_creation" => Some(MandateState::InCreation),
            "created" => Some(MandateState::Created),
            "accepted" => Some(MandateState::Accepted),
            "revoked" => Some(MandateState::Revoked),
            "rejected" => Some(MandateState::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for MandateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of communication channel pushed to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Phone,
    Email,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Phone => "phone",
            ContactKind::Email => "email",
        }
    }
}

/// The customer record of the brokerage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mandate {
    pub id: MandateId,
    pub gender: Gender,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub state: MandateState,
    /// Remote person id
    pub remote_id: Option<RemoteId>,
    pub phone_remote_id: Option<RemoteId>,
    pub email_remote_id: Option<RemoteId>,
    /// The signed mandate document
    pub primary_document: Option<MandateDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mandate {
    /// Creates a new mandate in the `Created` state
    pub fn new(
        gender: Gender,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: Address,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MandateId::new_v7(),
            gender,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthdate: None,
            address,
            phone: None,
            email: None,
            state: MandateState::Created,
            remote_id: None,
            phone_remote_id: None,
            email_remote_id: None,
            primary_document: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the display name
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns the phone number if one usable for the platform is on file
    pub fn usable_phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Returns the e-mail address if one is on file
    pub fn usable_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Returns the contact value for the given channel
    pub fn contact(&self, kind: ContactKind) -> Option<&str> {
        match kind {
            ContactKind::Phone => self.usable_phone(),
            ContactKind::Email => self.usable_email(),
        }
    }

    /// Returns the remote marker for the given channel
    pub fn contact_remote_id(&self, kind: ContactKind) -> Option<&RemoteId> {
        match kind {
            ContactKind::Phone => self.phone_remote_id.as_ref(),
            ContactKind::Email => self.email_remote_id.as_ref(),
        }
    }

    /// Whether the person exists on the platform
    pub fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }
}
