//! Append-only audit trail of adoption decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AdminSnapshot, AdoptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    #[serde(alias = "aprovar")]
    Approve,
}

/// A row of the `adoption_audit` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: String,
    pub adoption_id: String,
    pub action: AuditAction,
    pub old_status: AdoptionStatus,
    pub new_status: AdoptionStatus,
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAuditEntry {
    pub adoption_id: String,
    pub action: AuditAction,
    pub old_status: AdoptionStatus,
    pub new_status: AdoptionStatus,
    pub admin_id: Option<String>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    /// Entry for a `requested` → `approved` transition
    pub fn approval(adoption_id: &str, admin: &AdminSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            adoption_id: adoption_id.to_string(),
            action: AuditAction::Approve,
            old_status: AdoptionStatus::Requested,
            new_status: AdoptionStatus::Approved,
            admin_id: admin.id.clone(),
            admin_name: admin.name.clone(),
            admin_email: admin.email.clone(),
            created_at: at,
        }
    }
}
