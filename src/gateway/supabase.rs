//! Gateway backed by the PostgREST API of a Supabase project

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch::RemoteError;
use crate::gateway::{AccountRepository, AdoptionRepository, AnimalRepository, AuditRepository};
use crate::models::{
    Account, Adoption, AdoptionStatus, Animal, AnimalUpdate, ApprovalStamp, CancellationStamp,
    MatchField, NewAccount, NewAdoption, NewAnimal, NewAuditEntry,
};
use crate::postgrest::{PostgrestClient, SortOrder};

const ANIMALS: &str = "animals";
const ADOPTIONS: &str = "adoptions";
const AUDITS: &str = "adoption_audit";
const USERS: &str = "users";

/// Adoption columns with the linked animal embedded
const ADOPTION_WITH_ANIMAL: &str = "*,animal:animals(id,name,breed,size,age)";
const ACCOUNT_COLUMNS: &str = "id,name,email,role";

/// Postgres unique-violation code
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    postgrest: PostgrestClient,
}

impl SupabaseGateway {
    pub fn new(postgrest: PostgrestClient) -> Self {
        Self { postgrest }
    }

    fn first<T>(rows: Vec<T>, table: &str) -> Result<T> {
        rows.into_iter().next().ok_or_else(|| {
            Error::Remote(RemoteError::Decode(format!(
                "insert into {} returned no rows",
                table
            )))
        })
    }

    async fn insert_one<B, T>(&self, table: &str, row: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let rows: Vec<T> = self
            .postgrest
            .from(table)
            .insert(std::slice::from_ref(row))
            .await?;
        Self::first(rows, table)
    }
}

#[async_trait]
impl AnimalRepository for SupabaseGateway {
    async fn find_animal(&self, id: &str) -> Result<Option<Animal>> {
        Ok(self
            .postgrest
            .from(ANIMALS)
            .select("*")
            .eq("id", id)
            .single()
            .await?)
    }

    async fn list_animals(&self, only_available: bool) -> Result<Vec<Animal>> {
        let mut query = self.postgrest.from(ANIMALS).select("*");
        if only_available {
            query = query.eq("available", true);
        }
        Ok(query
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?)
    }

    async fn animal_ids_matching(&self, field: MatchField, value: &str) -> Result<Vec<String>> {
        let rows: Vec<IdRow> = self
            .postgrest
            .from(ANIMALS)
            .select("id")
            .eq(field.column(), value)
            .execute()
            .await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn insert_animal(&self, animal: &NewAnimal) -> Result<Animal> {
        self.insert_one(ANIMALS, animal).await
    }

    async fn update_animal(&self, id: &str, update: &AnimalUpdate) -> Result<Option<Animal>> {
        let rows: Vec<Animal> = self
            .postgrest
            .from(ANIMALS)
            .eq("id", id)
            .update(update)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn claim_animal(&self, id: &str) -> Result<bool> {
        let rows: Vec<IdRow> = self
            .postgrest
            .from(ANIMALS)
            .select("id")
            .eq("id", id)
            .eq("available", true)
            .update(&json!({ "available": false }))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn delete_animal(&self, id: &str) -> Result<()> {
        self.postgrest.from(ANIMALS).eq("id", id).delete().await?;
        Ok(())
    }
}

#[async_trait]
impl AdoptionRepository for SupabaseGateway {
    async fn find_adoption(&self, id: &str) -> Result<Option<Adoption>> {
        Ok(self
            .postgrest
            .from(ADOPTIONS)
            .select(ADOPTION_WITH_ANIMAL)
            .eq("id", id)
            .single()
            .await?)
    }

    async fn adoptions_for_animal(&self, animal_id: &str) -> Result<Vec<Adoption>> {
        Ok(self
            .postgrest
            .from(ADOPTIONS)
            .select("*")
            .eq("animal_id", animal_id)
            .execute()
            .await?)
    }

    async fn adoptions_for_animals(&self, animal_ids: &[String]) -> Result<Vec<Adoption>> {
        if animal_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .postgrest
            .from(ADOPTIONS)
            .select(ADOPTION_WITH_ANIMAL)
            .in_list("animal_id", animal_ids)
            .order("created_at", SortOrder::Descending)
            .execute()
            .await?)
    }

    async fn list_adoptions(&self, status: Option<AdoptionStatus>) -> Result<Vec<Adoption>> {
        let mut query = self.postgrest.from(ADOPTIONS).select(ADOPTION_WITH_ANIMAL);
        if let Some(status) = status {
            query = query.in_list("status", status.wire_values());
        }
        let order_column = match status {
            Some(AdoptionStatus::Approved) => "approved_at",
            _ => "created_at",
        };
        Ok(query
            .order(order_column, SortOrder::Descending)
            .execute()
            .await?)
    }

    async fn insert_adoption(&self, adoption: &NewAdoption) -> Result<Adoption> {
        self.insert_one(ADOPTIONS, adoption).await
    }

    async fn mark_approved(&self, id: &str, stamp: &ApprovalStamp) -> Result<bool> {
        let rows: Vec<IdRow> = self
            .postgrest
            .from(ADOPTIONS)
            .select("id")
            .eq("id", id)
            .in_list("status", AdoptionStatus::Requested.wire_values())
            .update(stamp)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn withdraw_approval(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let rows: Vec<IdRow> = self
            .postgrest
            .from(ADOPTIONS)
            .select("id")
            .eq("id", id)
            .in_list("status", AdoptionStatus::Approved.wire_values())
            .update(&json!({
                "status": AdoptionStatus::Cancelled,
                "cancelled_at": at,
                "approved_at": null,
                "approved_by_admin_id": null,
                "approved_by_admin_name": null,
                "approved_by_admin_email": null,
            }))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn cancel_siblings(
        &self,
        animal_id: &str,
        keep_id: &str,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let rows: Vec<IdRow> = self
            .postgrest
            .from(ADOPTIONS)
            .select("id")
            .eq("animal_id", animal_id)
            .neq("id", keep_id)
            .not_in("status", AdoptionStatus::Approved.wire_values())
            .update(&CancellationStamp::new(at))
            .await?;
        debug!(animal_id, cancelled = rows.len(), "cancelled competing adoptions");
        Ok(rows.len())
    }

    async fn delete_adoptions_for_animal(&self, animal_id: &str) -> Result<()> {
        self.postgrest
            .from(ADOPTIONS)
            .eq("animal_id", animal_id)
            .delete()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for SupabaseGateway {
    async fn record_audit(&self, entry: &NewAuditEntry) -> Result<()> {
        let _: serde_json::Value = self.insert_one(AUDITS, entry).await?;
        Ok(())
    }

    async fn delete_audits_for(&self, adoption_ids: &[String]) -> Result<()> {
        if adoption_ids.is_empty() {
            return Ok(());
        }
        self.postgrest
            .from(AUDITS)
            .in_list("adoption_id", adoption_ids)
            .delete()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for SupabaseGateway {
    async fn find_account_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>> {
        Ok(self
            .postgrest
            .from(USERS)
            .select(ACCOUNT_COLUMNS)
            .eq("email", email)
            .eq("password_hash", password_hash)
            .single()
            .await?)
    }

    async fn find_account(&self, id: &str) -> Result<Option<Account>> {
        Ok(self
            .postgrest
            .from(USERS)
            .select("*")
            .eq("id", id)
            .single()
            .await?)
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        let rows: std::result::Result<Vec<Account>, RemoteError> = self
            .postgrest
            .from(USERS)
            .select(ACCOUNT_COLUMNS)
            .insert(std::slice::from_ref(account))
            .await;
        match rows {
            Ok(rows) => Self::first(rows, USERS),
            Err(err) if err.code() == Some(UNIQUE_VIOLATION) => {
                Err(Error::conflict("e-mail already in use"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
