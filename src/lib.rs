//! Pet Adoption Client Library
//!
//! Client for a pet-adoption site whose data lives in a Supabase project:
//! the animal catalog, adoption requests, the admin approval workflow and
//! cascade deletion of listings.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod models;
pub mod postgrest;
pub mod services;
pub mod storage;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{Accounts, Session};
use crate::config::{AdoptionConfig, ClientOptions};
use crate::error::Result;
use crate::fetch::RemoteError;
use crate::gateway::{BlobStore, Gateway, SupabaseGateway};
use crate::postgrest::PostgrestClient;
use crate::services::{
    AdoptionDesk, AnimalRemoval, ApprovalOutcome, ApprovalWorkflow, Catalog, DeletedAnimal,
    ImageService, RelatedAnimals,
};
use crate::storage::StorageClient;

pub use crate::error::{Error, ErrorKind};

/// The main entry point for the pet adoption client
#[derive(Clone)]
pub struct PetAdoption {
    options: ClientOptions,
    accounts: Accounts,
    images: ImageService,
    related: RelatedAnimals,
    catalog: Catalog,
    desk: AdoptionDesk,
    approvals: ApprovalWorkflow,
    removal: AnimalRemoval,
}

impl PetAdoption {
    /// Connect to a Supabase project
    ///
    /// # Example
    ///
    /// ```
    /// use pet_adoption::{PetAdoption, config::{AdoptionConfig, ClientOptions}};
    ///
    /// let config = AdoptionConfig::new(
    ///     "https://your-project-url.supabase.co",
    ///     "your-anon-key",
    ///     ClientOptions::default(),
    /// ).unwrap();
    /// let client = PetAdoption::new(config).unwrap();
    /// ```
    pub fn new(config: AdoptionConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(RemoteError::from)?;

        let postgrest = PostgrestClient::new(config.url.as_str(), &config.anon_key, http_client.clone());
        let bucket = StorageClient::new(config.url.as_str(), &config.anon_key, http_client)
            .from(&config.options.bucket);

        Ok(Self::with_backend(
            Arc::new(SupabaseGateway::new(postgrest)),
            Arc::new(bucket),
            config.options,
        ))
    }

    /// Connect using the `SUPABASE_*` and `ADOPTION_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AdoptionConfig::from_env()?)
    }

    /// Build the services over any gateway and blob store
    pub fn with_backend(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn BlobStore>,
        options: ClientOptions,
    ) -> Self {
        let images = ImageService::new(store, &options.image_folder, options.max_image_bytes);
        let related = RelatedAnimals::new(gateway.clone());
        let removal = AnimalRemoval::new(gateway.clone(), images.clone());

        Self {
            accounts: Accounts::new(gateway.clone(), options.allow_fallback_login),
            catalog: Catalog::new(gateway.clone(), images.clone(), removal.clone()),
            desk: AdoptionDesk::new(gateway.clone(), related.clone()),
            approvals: ApprovalWorkflow::new(gateway),
            images,
            related,
            removal,
            options,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Login, registration and profiles
    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Animal listings
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Adoption requests
    pub fn desk(&self) -> &AdoptionDesk {
        &self.desk
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }

    pub fn related(&self) -> &RelatedAnimals {
        &self.related
    }

    /// Approve an adoption request, see [`ApprovalWorkflow::approve`]
    pub async fn approve(&self, session: &Session, adoption_id: &str) -> Result<ApprovalOutcome> {
        self.approvals.approve(session, adoption_id).await
    }

    /// Delete an animal with its requests, see [`AnimalRemoval::delete_animal`]
    pub async fn delete_animal(&self, session: &Session, animal_id: &str) -> Result<DeletedAnimal> {
        self.removal.delete_animal(session, animal_id).await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Registration, Session, SessionFile};
    pub use crate::config::{AdoptionConfig, ClientOptions};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::models::{Adoption, AdoptionStatus, Animal, Role};
    pub use crate::services::{AdoptionForm, AnimalDraft, AnimalEdit, ImageUpload};
    pub use crate::PetAdoption;
}
