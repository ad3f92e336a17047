//! Approval of adoption requests
//!
//! Approving one request closes the case for the animal: every competing
//! request is cancelled, the animal leaves the catalog and the decision is
//! written to the audit trail.
//!
//! Taking the animal off the catalog is a conditional update on
//! `available=true`, so when two admins approve different requests for the
//! same animal only one of them gets the animal. The other withdraws its own
//! approval and fails with a conflict. Cancelling competing requests and the
//! audit record are best effort and come back as warnings.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{AdoptionStatus, ApprovalStamp, NewAuditEntry};
use crate::services::saga::{Saga, StepWarning};

pub(crate) const STEP_APPROVE: &str = "approve request";
pub(crate) const STEP_CANCEL: &str = "cancel competing requests";
pub(crate) const STEP_UNLIST: &str = "mark animal unavailable";
pub(crate) const STEP_WITHDRAW: &str = "withdraw approval";
pub(crate) const STEP_AUDIT: &str = "record audit";

/// Result of a successful approval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub adoption_id: String,
    pub animal_id: String,
    pub animal_name: Option<String>,
    /// Competing requests moved to `cancelled`; zero when that step failed
    pub cancelled_siblings: usize,
    pub warnings: Vec<StepWarning>,
}

impl ApprovalOutcome {
    pub fn audit_recorded(&self) -> bool {
        !self.warnings.iter().any(|w| w.step == STEP_AUDIT)
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Confirmation shown to the admin
    pub fn user_message(&self) -> String {
        if !self.audit_recorded() {
            "Adoption approved, but the audit record could not be written.".to_string()
        } else if !self.is_complete() {
            "Adoption approved, with warnings.".to_string()
        } else {
            "Adoption approved.".to_string()
        }
    }
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    gateway: Arc<dyn Gateway>,
}

impl ApprovalWorkflow {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn approve(&self, session: &Session, adoption_id: &str) -> Result<ApprovalOutcome> {
        session.require_admin("approve adoptions")?;

        let adoption = self
            .gateway
            .find_adoption(adoption_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("adoption {} does not exist", adoption_id)))?;

        if !adoption.status.can_transition_to(AdoptionStatus::Approved) {
            return Err(Error::invalid_state(
                "only requested adoptions may be approved",
            ));
        }

        let animal = self
            .gateway
            .find_animal(&adoption.animal_id)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("animal {} does not exist", adoption.animal_id))
            })?;
        if !animal.available {
            return Err(Error::conflict("the animal is no longer available for adoption"));
        }

        let admin = session.admin_snapshot();
        let now = Utc::now();
        let mut saga = Saga::new("approve adoption");

        let changed = saga
            .required(
                STEP_APPROVE,
                self.gateway
                    .mark_approved(adoption_id, &ApprovalStamp::new(&admin, now)),
            )
            .await?;
        if !changed {
            warn!(adoption_id, "request changed state before it could be approved");
            return Err(Error::invalid_state(
                "only requested adoptions may be approved",
            ));
        }

        let cancelled = saga
            .best_effort(
                STEP_CANCEL,
                self.gateway
                    .cancel_siblings(&adoption.animal_id, adoption_id, now),
            )
            .await
            .unwrap_or(0);

        let claimed = saga
            .required(STEP_UNLIST, self.gateway.claim_animal(&adoption.animal_id))
            .await?;
        if !claimed {
            warn!(
                adoption_id,
                animal_id = %adoption.animal_id,
                "animal was taken by a concurrent approval, withdrawing"
            );
            saga.required(
                STEP_WITHDRAW,
                self.gateway.withdraw_approval(adoption_id, Utc::now()),
            )
            .await?;
            return Err(Error::conflict(
                "another request for this animal was approved first",
            ));
        }

        saga.best_effort(
            STEP_AUDIT,
            self.gateway
                .record_audit(&NewAuditEntry::approval(adoption_id, &admin, now)),
        )
        .await;

        info!(
            adoption_id,
            animal_id = %adoption.animal_id,
            cancelled,
            admin_id = ?admin.id,
            "adoption approved"
        );

        Ok(ApprovalOutcome {
            adoption_id: adoption.id.clone(),
            animal_id: adoption.animal_id.clone(),
            animal_name: adoption.animal_name().map(str::to_string),
            cancelled_siblings: cancelled,
            warnings: saga.into_warnings(),
        })
    }
}
