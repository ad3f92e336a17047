//! Adoption requests from visitors and the admin views over them

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{Adoption, AdoptionStatus, Animal, NewAdoption};
use crate::services::non_empty;
use crate::services::related::RelatedAnimals;

/// Adoption request form
#[derive(Debug, Clone, Default)]
pub struct AdoptionForm {
    pub animal_id: String,
    pub adopter_name: String,
    pub adopter_email: String,
    pub adopter_phone: String,
    pub adopter_city: String,
    pub message: String,
}

impl AdoptionForm {
    fn validate(&self) -> Result<NewAdoption> {
        let animal_id = self.animal_id.trim();
        if animal_id.is_empty() {
            return Err(Error::validation("no animal selected"));
        }
        let name = self.adopter_name.trim();
        let email = self.adopter_email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(Error::validation("name and e-mail are required"));
        }
        Ok(NewAdoption {
            animal_id: animal_id.to_string(),
            adopter_name: name.to_string(),
            adopter_email: email.to_string(),
            adopter_phone: non_empty(&self.adopter_phone),
            adopter_city: non_empty(&self.adopter_city),
            message: non_empty(&self.message),
            status: AdoptionStatus::Requested,
        })
    }
}

/// Requests gathered for one listing and the animals related to it
#[derive(Debug, Clone)]
pub struct ListingRequests {
    pub animal: Animal,
    pub related_ids: BTreeSet<String>,
    /// Newest first
    pub adoptions: Vec<Adoption>,
}

impl ListingRequests {
    /// Requests an admin can still act on
    pub fn selectable(&self) -> impl Iterator<Item = &Adoption> {
        self.adoptions
            .iter()
            .filter(|a| a.status == AdoptionStatus::Requested)
    }

    pub fn has_approved(&self) -> bool {
        self.adoptions
            .iter()
            .any(|a| a.status == AdoptionStatus::Approved)
    }
}

#[derive(Clone)]
pub struct AdoptionDesk {
    gateway: Arc<dyn Gateway>,
    related: RelatedAnimals,
}

impl AdoptionDesk {
    pub fn new(gateway: Arc<dyn Gateway>, related: RelatedAnimals) -> Self {
        Self { gateway, related }
    }

    /// File a new request for an animal
    pub async fn submit(&self, form: &AdoptionForm) -> Result<Adoption> {
        let request = form.validate()?;
        if self.gateway.find_animal(&request.animal_id).await?.is_none() {
            return Err(Error::not_found(format!(
                "animal {} does not exist",
                request.animal_id
            )));
        }
        let adoption = self.gateway.insert_adoption(&request).await?;
        info!(adoption_id = %adoption.id, animal_id = %adoption.animal_id, "adoption requested");
        Ok(adoption)
    }

    /// Every request with its animal, newest first
    pub async fn all_requests(&self) -> Result<Vec<Adoption>> {
        self.gateway.list_adoptions(None).await
    }

    pub async fn requests_for_listing(&self, animal_id: &str) -> Result<ListingRequests> {
        let animal = self
            .gateway
            .find_animal(animal_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("animal {} does not exist", animal_id)))?;
        let related_ids = self.related.related_ids(&animal).await?;
        let ids: Vec<String> = related_ids.iter().cloned().collect();
        let adoptions = self.gateway.adoptions_for_animals(&ids).await?;
        Ok(ListingRequests {
            animal,
            related_ids,
            adoptions,
        })
    }

    /// Approved adoptions, most recent approval first
    pub async fn history(&self) -> Result<Vec<Adoption>> {
        self.gateway
            .list_adoptions(Some(AdoptionStatus::Approved))
            .await
    }
}
