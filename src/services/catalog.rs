//! Animal listings and their maintenance by administrators

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::Session;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{AdoptionStatus, Animal, AnimalUpdate, NewAnimal};
use crate::services::deletion::{AnimalRemoval, DeletedAnimal};
use crate::services::images::{ImageService, ImageUpload};
use crate::services::non_empty;

/// Species recorded for animals registered through the site
pub const DEFAULT_SPECIES: &str = "dog";

/// Registration form for a new animal
#[derive(Debug, Clone, Default)]
pub struct AnimalDraft {
    pub name: String,
    pub age: Option<u32>,
    pub breed: String,
    pub size: String,
    pub personality: String,
    pub health: String,
}

impl AnimalDraft {
    /// `Personality: … | Health: …`, leaving out empty parts
    pub fn description(&self) -> Option<String> {
        let parts: Vec<String> = [
            ("Personality", self.personality.trim()),
            ("Health", self.health.trim()),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect();
        (!parts.is_empty()).then(|| parts.join(" | "))
    }

    fn into_new_animal(self, image_url: String) -> NewAnimal {
        let description = self.description();
        NewAnimal {
            name: non_empty(&self.name),
            species: Some(DEFAULT_SPECIES.to_string()),
            breed: non_empty(&self.breed),
            age: self.age,
            size: non_empty(&self.size),
            description,
            available: true,
            image_url: Some(image_url),
        }
    }
}

/// Edit form for an existing animal; blank fields are cleared
#[derive(Debug, Clone, Default)]
pub struct AnimalEdit {
    pub name: String,
    pub age: Option<u32>,
    pub species: String,
    pub breed: String,
    pub size: String,
    pub description: String,
    pub available: bool,
}

impl AnimalEdit {
    /// Form prefilled from a stored animal
    pub fn from_animal(animal: &Animal) -> Self {
        Self {
            name: animal.name.clone().unwrap_or_default(),
            age: animal.age,
            species: animal.species.clone().unwrap_or_default(),
            breed: animal.breed.clone().unwrap_or_default(),
            size: animal.size.clone().unwrap_or_default(),
            description: animal.description.clone().unwrap_or_default(),
            available: animal.available,
        }
    }

    fn to_update(&self, image_url: Option<String>) -> AnimalUpdate {
        AnimalUpdate {
            name: non_empty(&self.name),
            species: non_empty(&self.species),
            breed: non_empty(&self.breed),
            age: self.age,
            size: non_empty(&self.size),
            description: non_empty(&self.description),
            available: self.available,
            image_url,
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    gateway: Arc<dyn Gateway>,
    images: ImageService,
    removal: AnimalRemoval,
}

impl Catalog {
    pub fn new(gateway: Arc<dyn Gateway>, images: ImageService, removal: AnimalRemoval) -> Self {
        Self {
            gateway,
            images,
            removal,
        }
    }

    /// Animals open for adoption, newest first
    pub async fn available_animals(&self) -> Result<Vec<Animal>> {
        self.gateway.list_animals(true).await
    }

    /// Every animal, newest first
    pub async fn all_animals(&self) -> Result<Vec<Animal>> {
        self.gateway.list_animals(false).await
    }

    pub async fn animal(&self, id: &str) -> Result<Animal> {
        self.gateway
            .find_animal(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("animal {} does not exist", id)))
    }

    /// Register an animal; a photo is mandatory and is uploaded first
    pub async fn register_animal(
        &self,
        session: &Session,
        draft: AnimalDraft,
        image: Option<&ImageUpload>,
    ) -> Result<Animal> {
        session.require_admin("register animals")?;
        let image = image.ok_or_else(|| Error::validation("choose a photo of the animal"))?;

        let image_url = self.images.upload(image).await?;
        match self
            .gateway
            .insert_animal(&draft.into_new_animal(image_url.clone()))
            .await
        {
            Ok(animal) => {
                info!(animal_id = %animal.id, "animal registered");
                Ok(animal)
            }
            Err(e) => {
                warn!(error = %e, "animal insert failed, removing uploaded photo");
                self.images.delete(&image_url).await;
                Err(e)
            }
        }
    }

    /// Save an edit, optionally replacing the photo
    pub async fn update_animal(
        &self,
        session: &Session,
        id: &str,
        edit: &AnimalEdit,
        new_image: Option<&ImageUpload>,
    ) -> Result<Animal> {
        session.require_admin("edit animals")?;
        let current = self.animal(id).await?;
        if edit.available {
            let adoptions = self.gateway.adoptions_for_animal(id).await?;
            if adoptions.iter().any(|a| a.status == AdoptionStatus::Approved) {
                return Err(Error::conflict("an adopted animal cannot be listed again"));
            }
        }

        let new_url = match new_image {
            Some(image) => Some(self.images.upload(image).await?),
            None => None,
        };

        let updated = match self
            .gateway
            .update_animal(id, &edit.to_update(new_url.clone()))
            .await
        {
            Ok(Some(animal)) => animal,
            Ok(None) => {
                self.discard_upload(new_url.as_deref()).await;
                return Err(Error::not_found(format!("animal {} does not exist", id)));
            }
            Err(e) => {
                self.discard_upload(new_url.as_deref()).await;
                return Err(e);
            }
        };

        if let (Some(new_url), Some(old_url)) = (new_url.as_deref(), current.image_url.as_deref()) {
            if new_url != old_url {
                self.images.delete(old_url).await;
            }
        }

        info!(animal_id = id, photo_replaced = new_url.is_some(), "animal updated");
        Ok(updated)
    }

    async fn discard_upload(&self, url: Option<&str>) {
        if let Some(url) = url {
            self.images.delete(url).await;
        }
    }

    /// Cascade delete, see [`AnimalRemoval::delete_animal`]
    pub async fn delete_animal(&self, session: &Session, id: &str) -> Result<DeletedAnimal> {
        self.removal.delete_animal(session, id).await
    }
}
