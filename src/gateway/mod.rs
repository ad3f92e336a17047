//! Persistence gateway
//!
//! Services talk to the backend only through the traits in this module, so the
//! workflows can run against the Supabase implementation in production and an
//! in-memory one in tests.

mod supabase;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Account, Adoption, AdoptionStatus, Animal, AnimalUpdate, ApprovalStamp, MatchField,
    NewAccount, NewAdoption, NewAnimal, NewAuditEntry,
};
use crate::storage::FileOptions;

pub use supabase::SupabaseGateway;

#[async_trait]
pub trait AnimalRepository: Send + Sync {
    async fn find_animal(&self, id: &str) -> Result<Option<Animal>>;

    /// Animals newest first, optionally only those still available
    async fn list_animals(&self, only_available: bool) -> Result<Vec<Animal>>;

    /// Ids of animals whose `field` equals `value`
    async fn animal_ids_matching(&self, field: MatchField, value: &str) -> Result<Vec<String>>;

    async fn insert_animal(&self, animal: &NewAnimal) -> Result<Animal>;

    /// Returns `None` when no row has this id
    async fn update_animal(&self, id: &str, update: &AnimalUpdate) -> Result<Option<Animal>>;

    /// Take a listed animal off the catalog. `false` when it was already
    /// unavailable, which makes concurrent approvals exclusive.
    async fn claim_animal(&self, id: &str) -> Result<bool>;

    async fn delete_animal(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait AdoptionRepository: Send + Sync {
    /// One adoption with its embedded animal
    async fn find_adoption(&self, id: &str) -> Result<Option<Adoption>>;

    async fn adoptions_for_animal(&self, animal_id: &str) -> Result<Vec<Adoption>>;

    /// Adoptions for any of `animal_ids`, newest first, with embedded animals
    async fn adoptions_for_animals(&self, animal_ids: &[String]) -> Result<Vec<Adoption>>;

    /// All adoptions with embedded animals, optionally restricted to one status.
    /// Approved ones are ordered by approval time, the rest by creation time.
    async fn list_adoptions(&self, status: Option<AdoptionStatus>) -> Result<Vec<Adoption>>;

    async fn insert_adoption(&self, adoption: &NewAdoption) -> Result<Adoption>;

    /// Approve `id` only if it is still `requested`; `false` if no row changed
    async fn mark_approved(&self, id: &str, stamp: &ApprovalStamp) -> Result<bool>;

    /// Move an approval that lost the claim on its animal to `cancelled`,
    /// clearing the approval stamp; `false` if `id` was not approved
    async fn withdraw_approval(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Cancel every adoption of `animal_id` except `keep_id` that is not
    /// approved; returns how many rows changed
    async fn cancel_siblings(
        &self,
        animal_id: &str,
        keep_id: &str,
        at: DateTime<Utc>,
    ) -> Result<usize>;

    async fn delete_adoptions_for_animal(&self, animal_id: &str) -> Result<()>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn record_audit(&self, entry: &NewAuditEntry) -> Result<()>;

    async fn delete_audits_for(&self, adoption_ids: &[String]) -> Result<()>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_account_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>>;

    async fn find_account(&self, id: &str) -> Result<Option<Account>>;

    /// Fails with a conflict when the e-mail is already registered
    async fn insert_account(&self, account: &NewAccount) -> Result<Account>;
}

/// Everything the services need from the database
pub trait Gateway:
    AnimalRepository + AdoptionRepository + AuditRepository + AccountRepository
{
}

impl<T> Gateway for T where
    T: AnimalRepository + AdoptionRepository + AuditRepository + AccountRepository
{
}

/// Object storage for animal photos
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket the objects live in
    fn bucket(&self) -> &str;

    async fn upload(&self, path: &str, data: Bytes, options: FileOptions) -> Result<()>;

    fn public_url(&self, path: &str) -> String;

    async fn remove(&self, paths: &[String]) -> Result<()>;
}
