//! Cascade deletion of an animal with its requests, audit trail and photo

use std::sync::Arc;
use tracing::info;

use crate::auth::Session;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::AdoptionStatus;
use crate::services::images::ImageService;
use crate::services::saga::{Saga, StepWarning};

/// What a successful cascade delete removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedAnimal {
    /// Display name of the removed animal, for the confirmation message
    pub name: String,
    pub removed_adoptions: usize,
    /// Set when the photo could not be removed
    pub warnings: Vec<StepWarning>,
}

#[derive(Clone)]
pub struct AnimalRemoval {
    gateway: Arc<dyn Gateway>,
    images: ImageService,
}

impl AnimalRemoval {
    pub fn new(gateway: Arc<dyn Gateway>, images: ImageService) -> Self {
        Self { gateway, images }
    }

    /// Delete an animal and everything hanging off it, children first.
    ///
    /// Refused while any of its adoptions is approved.
    pub async fn delete_animal(&self, session: &Session, animal_id: &str) -> Result<DeletedAnimal> {
        session.require_admin("delete animals")?;

        let animal = self
            .gateway
            .find_animal(animal_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("animal {} does not exist", animal_id)))?;
        let adoptions = self.gateway.adoptions_for_animal(animal_id).await?;

        if adoptions
            .iter()
            .any(|a| a.status == AdoptionStatus::Approved)
        {
            return Err(Error::conflict(
                "this animal has an approved adoption and cannot be deleted",
            ));
        }

        let adoption_ids: Vec<String> = adoptions.iter().map(|a| a.id.clone()).collect();
        let mut saga = Saga::new("delete animal");

        if adoption_ids.is_empty() {
            saga.skip("delete audits");
            saga.skip("delete adoptions");
        } else {
            saga.required("delete audits", self.gateway.delete_audits_for(&adoption_ids))
                .await?;
            saga.required(
                "delete adoptions",
                self.gateway.delete_adoptions_for_animal(animal_id),
            )
            .await?;
        }

        if let Some(url) = animal.image_url.as_deref().filter(|u| !u.is_empty()) {
            saga.best_effort("delete photo", self.images.remove(url))
                .await;
        }

        saga.required("delete animal", self.gateway.delete_animal(animal_id))
            .await?;

        info!(animal_id, removed_adoptions = adoption_ids.len(), "animal deleted");
        Ok(DeletedAnimal {
            name: animal.display_name().to_string(),
            removed_adoptions: adoption_ids.len(),
            warnings: saga.into_warnings(),
        })
    }
}
