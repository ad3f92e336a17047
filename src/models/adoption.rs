//! Adoption requests and their status machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::AnimalSummary;

/// Lifecycle of an adoption request.
///
/// `Requested` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionStatus {
    #[serde(alias = "requisitado")]
    Requested,
    #[serde(alias = "aprovado")]
    Approved,
    #[serde(alias = "cancelado", alias = "canceled")]
    Cancelled,
}

impl AdoptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdoptionStatus::Requested => "requested",
            AdoptionStatus::Approved => "approved",
            AdoptionStatus::Cancelled => "cancelled",
        }
    }

    /// Every stored spelling of this status, the written one first. Filters
    /// must match all of them since older rows use the legacy values.
    pub fn wire_values(&self) -> &'static [&'static str] {
        match self {
            AdoptionStatus::Requested => &["requested", "requisitado"],
            AdoptionStatus::Approved => &["approved", "aprovado"],
            AdoptionStatus::Cancelled => &["cancelled", "cancelado", "canceled"],
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AdoptionStatus::Requested)
    }

    pub fn can_transition_to(&self, next: AdoptionStatus) -> bool {
        matches!(
            (self, next),
            (AdoptionStatus::Requested, AdoptionStatus::Approved)
                | (AdoptionStatus::Requested, AdoptionStatus::Cancelled)
        )
    }
}

impl fmt::Display for AdoptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `adoptions` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adoption {
    pub id: String,
    pub animal_id: String,
    #[serde(default)]
    pub adopter_name: Option<String>,
    #[serde(default)]
    pub adopter_email: Option<String>,
    #[serde(default)]
    pub adopter_phone: Option<String>,
    #[serde(default)]
    pub adopter_city: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: AdoptionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by_admin_id: Option<String>,
    #[serde(default)]
    pub approved_by_admin_name: Option<String>,
    #[serde(default)]
    pub approved_by_admin_email: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Linked animal, when the query embedded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animal: Option<AnimalSummary>,
}

impl Adoption {
    /// Phone and e-mail joined for display, skipping missing parts
    pub fn contact(&self) -> String {
        [self.adopter_phone.as_deref(), self.adopter_email.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    pub fn animal_name(&self) -> Option<&str> {
        self.animal.as_ref().and_then(|a| a.name.as_deref())
    }
}

/// Insert payload for a new request; the status is always `requested`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAdoption {
    pub animal_id: String,
    pub adopter_name: String,
    pub adopter_email: String,
    pub adopter_phone: Option<String>,
    pub adopter_city: Option<String>,
    pub message: Option<String>,
    pub status: AdoptionStatus,
}

/// Snapshot of the admin acting on a request, copied onto the rows it touches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AdminSnapshot {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Columns written when a request is approved
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApprovalStamp {
    pub status: AdoptionStatus,
    pub approved_at: DateTime<Utc>,
    pub approved_by_admin_id: Option<String>,
    pub approved_by_admin_name: Option<String>,
    pub approved_by_admin_email: Option<String>,
}

impl ApprovalStamp {
    pub fn new(admin: &AdminSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            status: AdoptionStatus::Approved,
            approved_at: at,
            approved_by_admin_id: admin.id.clone(),
            approved_by_admin_name: admin.name.clone(),
            approved_by_admin_email: admin.email.clone(),
        }
    }
}

/// Columns written when a competing request is cancelled
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CancellationStamp {
    pub status: AdoptionStatus,
    pub cancelled_at: DateTime<Utc>,
}

impl CancellationStamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            status: AdoptionStatus::Cancelled,
            cancelled_at: at,
        }
    }
}
