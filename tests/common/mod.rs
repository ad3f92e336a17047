#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use pet_adoption::auth::{password_hash, Session};
use pet_adoption::config::ClientOptions;
use pet_adoption::error::{Error, Result};
use pet_adoption::fetch::RemoteError;
use pet_adoption::gateway::{
    AccountRepository, AdoptionRepository, AnimalRepository, AuditRepository, BlobStore,
};
use pet_adoption::models::*;
use pet_adoption::storage::FileOptions;
use pet_adoption::PetAdoption;

pub const PUBLIC_BASE: &str = "https://demo.supabase.co/storage/v1/object/public";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unavailable(op: &str) -> Error {
    Error::Remote(RemoteError::Unparsed {
        message: format!("{} unavailable", op),
        status: StatusCode::SERVICE_UNAVAILABLE,
    })
}

type Hook = Box<dyn FnOnce(&mut State) + Send>;

#[derive(Default)]
pub struct State {
    pub animals: Vec<Animal>,
    pub adoptions: Vec<Adoption>,
    pub audits: Vec<AuditEntry>,
    pub accounts: Vec<(Account, String)>,
    seq: i64,
}

impl State {
    /// Strictly increasing timestamps so ordering is deterministic
    fn tick(&mut self) -> DateTime<Utc> {
        self.seq += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.seq)
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{}-{}", prefix, self.seq)
    }

    fn with_animal(&self, mut adoption: Adoption) -> Adoption {
        adoption.animal = self
            .animals
            .iter()
            .find(|a| a.id == adoption.animal_id)
            .map(AnimalSummary::from);
        adoption
    }
}

/// In-memory stand-in for the Supabase tables
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    failures: Mutex<HashSet<&'static str>>,
    hooks: Mutex<HashMap<&'static str, Hook>>,
    calls: Mutex<Vec<&'static str>>,
    interleave: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later call of `op` fail with a 503
    pub fn fail(&self, op: &'static str) {
        self.failures.lock().unwrap().insert(op);
    }

    /// Run `hook` against the tables right before the next call of `op`
    pub fn before<F>(&self, op: &'static str, hook: F)
    where
        F: FnOnce(&mut State) + Send + 'static,
    {
        self.hooks.lock().unwrap().insert(op, Box::new(hook));
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Yield to the runtime before every call, so concurrent workflows
    /// interleave the way remote calls do
    pub fn interleave(&self) {
        self.interleave.store(true, Ordering::SeqCst);
    }

    async fn enter(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        if self.interleave.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.calls.lock().unwrap().push(op);
        let mut state = self.state.lock().unwrap();
        if let Some(hook) = self.hooks.lock().unwrap().remove(op) {
            hook(&mut *state);
        }
        if self.failures.lock().unwrap().contains(op) {
            return Err(unavailable(op));
        }
        Ok(state)
    }

    pub fn seed_animal(&self, name: &str, breed: &str, size: &str, age: Option<u32>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("animal");
        let created_at = state.tick();
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        state.animals.push(Animal {
            id: id.clone(),
            name: opt(name),
            species: Some("dog".into()),
            breed: opt(breed),
            age,
            size: opt(size),
            description: None,
            available: true,
            image_url: None,
            created_at: Some(created_at),
        });
        id
    }

    pub fn set_image(&self, animal_id: &str, url: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(animal) = state.animals.iter_mut().find(|a| a.id == animal_id) {
            animal.image_url = Some(url.to_string());
        }
    }

    pub fn seed_adoption(&self, animal_id: &str, adopter: &str, status: AdoptionStatus) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("adoption");
        let created_at = state.tick();
        let approved_at = (status == AdoptionStatus::Approved).then_some(created_at);
        state.adoptions.push(Adoption {
            id: id.clone(),
            animal_id: animal_id.to_string(),
            adopter_name: Some(adopter.to_string()),
            adopter_email: Some(format!("{}@example.com", adopter.to_lowercase())),
            adopter_phone: None,
            adopter_city: None,
            message: None,
            status,
            created_at: Some(created_at),
            approved_at,
            approved_by_admin_id: None,
            approved_by_admin_name: None,
            approved_by_admin_email: None,
            cancelled_at: None,
            animal: None,
        });
        id
    }

    pub fn seed_audit(&self, adoption_id: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("audit");
        let created_at = state.tick();
        state.audits.push(AuditEntry {
            id,
            adoption_id: adoption_id.to_string(),
            action: AuditAction::Approve,
            old_status: AdoptionStatus::Requested,
            new_status: AdoptionStatus::Approved,
            admin_id: None,
            admin_name: None,
            admin_email: None,
            created_at: Some(created_at),
        });
    }

    pub fn seed_account(&self, email: &str, password: &str, role: Role) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("user");
        state.accounts.push((
            Account {
                id: id.clone(),
                name: Some(email.split('@').next().unwrap_or(email).to_string()),
                email: Some(email.to_string()),
                role,
                phone: None,
                city: Some("Recife".into()),
                address: None,
                photo_url: None,
            },
            password_hash(password),
        ));
        id
    }

    pub fn animal(&self, id: &str) -> Option<Animal> {
        let state = self.state.lock().unwrap();
        state.animals.iter().find(|a| a.id == id).cloned()
    }

    pub fn animals(&self) -> Vec<Animal> {
        self.state.lock().unwrap().animals.clone()
    }

    pub fn adoption(&self, id: &str) -> Option<Adoption> {
        let state = self.state.lock().unwrap();
        state.adoptions.iter().find(|a| a.id == id).cloned()
    }

    pub fn adoptions(&self) -> Vec<Adoption> {
        self.state.lock().unwrap().adoptions.clone()
    }

    pub fn audits(&self) -> Vec<AuditEntry> {
        self.state.lock().unwrap().audits.clone()
    }
}

#[async_trait]
impl AnimalRepository for MemoryGateway {
    async fn find_animal(&self, id: &str) -> Result<Option<Animal>> {
        let state = self.enter("find_animal").await?;
        Ok(state.animals.iter().find(|a| a.id == id).cloned())
    }

    async fn list_animals(&self, only_available: bool) -> Result<Vec<Animal>> {
        let state = self.enter("list_animals").await?;
        let mut animals: Vec<Animal> = state
            .animals
            .iter()
            .filter(|a| !only_available || a.available)
            .cloned()
            .collect();
        animals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(animals)
    }

    async fn animal_ids_matching(&self, field: MatchField, value: &str) -> Result<Vec<String>> {
        let state = self.enter("animal_ids_matching").await?;
        Ok(state
            .animals
            .iter()
            .filter(|a| field.value_of(a).as_deref() == Some(value))
            .map(|a| a.id.clone())
            .collect())
    }

    async fn insert_animal(&self, animal: &NewAnimal) -> Result<Animal> {
        let mut state = self.enter("insert_animal").await?;
        let id = state.next_id("animal");
        let created_at = state.tick();
        let row = Animal {
            id,
            name: animal.name.clone(),
            species: animal.species.clone(),
            breed: animal.breed.clone(),
            age: animal.age,
            size: animal.size.clone(),
            description: animal.description.clone(),
            available: animal.available,
            image_url: animal.image_url.clone(),
            created_at: Some(created_at),
        };
        state.animals.push(row.clone());
        Ok(row)
    }

    async fn update_animal(&self, id: &str, update: &AnimalUpdate) -> Result<Option<Animal>> {
        let mut state = self.enter("update_animal").await?;
        let Some(animal) = state.animals.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        animal.name = update.name.clone();
        animal.species = update.species.clone();
        animal.breed = update.breed.clone();
        animal.age = update.age;
        animal.size = update.size.clone();
        animal.description = update.description.clone();
        animal.available = update.available;
        if let Some(url) = &update.image_url {
            animal.image_url = Some(url.clone());
        }
        Ok(Some(animal.clone()))
    }

    async fn claim_animal(&self, id: &str) -> Result<bool> {
        let mut state = self.enter("claim_animal").await?;
        match state.animals.iter_mut().find(|a| a.id == id && a.available) {
            Some(animal) => {
                animal.available = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_animal(&self, id: &str) -> Result<()> {
        let mut state = self.enter("delete_animal").await?;
        state.animals.retain(|a| a.id != id);
        Ok(())
    }
}

#[async_trait]
impl AdoptionRepository for MemoryGateway {
    async fn find_adoption(&self, id: &str) -> Result<Option<Adoption>> {
        let state = self.enter("find_adoption").await?;
        Ok(state
            .adoptions
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .map(|a| state.with_animal(a)))
    }

    async fn adoptions_for_animal(&self, animal_id: &str) -> Result<Vec<Adoption>> {
        let state = self.enter("adoptions_for_animal").await?;
        Ok(state
            .adoptions
            .iter()
            .filter(|a| a.animal_id == animal_id)
            .cloned()
            .collect())
    }

    async fn adoptions_for_animals(&self, animal_ids: &[String]) -> Result<Vec<Adoption>> {
        let state = self.enter("adoptions_for_animals").await?;
        let mut rows: Vec<Adoption> = state
            .adoptions
            .iter()
            .filter(|a| animal_ids.contains(&a.animal_id))
            .cloned()
            .map(|a| state.with_animal(a))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_adoptions(&self, status: Option<AdoptionStatus>) -> Result<Vec<Adoption>> {
        let state = self.enter("list_adoptions").await?;
        let mut rows: Vec<Adoption> = state
            .adoptions
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .map(|a| state.with_animal(a))
            .collect();
        if status == Some(AdoptionStatus::Approved) {
            rows.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
        } else {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(rows)
    }

    async fn insert_adoption(&self, adoption: &NewAdoption) -> Result<Adoption> {
        let mut state = self.enter("insert_adoption").await?;
        let id = state.next_id("adoption");
        let created_at = state.tick();
        let row = Adoption {
            id,
            animal_id: adoption.animal_id.clone(),
            adopter_name: Some(adoption.adopter_name.clone()),
            adopter_email: Some(adoption.adopter_email.clone()),
            adopter_phone: adoption.adopter_phone.clone(),
            adopter_city: adoption.adopter_city.clone(),
            message: adoption.message.clone(),
            status: adoption.status,
            created_at: Some(created_at),
            approved_at: None,
            approved_by_admin_id: None,
            approved_by_admin_name: None,
            approved_by_admin_email: None,
            cancelled_at: None,
            animal: None,
        };
        state.adoptions.push(row.clone());
        Ok(row)
    }

    async fn mark_approved(&self, id: &str, stamp: &ApprovalStamp) -> Result<bool> {
        let mut state = self.enter("mark_approved").await?;
        match state
            .adoptions
            .iter_mut()
            .find(|a| a.id == id && a.status == AdoptionStatus::Requested)
        {
            Some(adoption) => {
                adoption.status = stamp.status;
                adoption.approved_at = Some(stamp.approved_at);
                adoption.approved_by_admin_id = stamp.approved_by_admin_id.clone();
                adoption.approved_by_admin_name = stamp.approved_by_admin_name.clone();
                adoption.approved_by_admin_email = stamp.approved_by_admin_email.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn withdraw_approval(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.enter("withdraw_approval").await?;
        match state
            .adoptions
            .iter_mut()
            .find(|a| a.id == id && a.status == AdoptionStatus::Approved)
        {
            Some(adoption) => {
                adoption.status = AdoptionStatus::Cancelled;
                adoption.cancelled_at = Some(at);
                adoption.approved_at = None;
                adoption.approved_by_admin_id = None;
                adoption.approved_by_admin_name = None;
                adoption.approved_by_admin_email = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn cancel_siblings(
        &self,
        animal_id: &str,
        keep_id: &str,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let mut state = self.enter("cancel_siblings").await?;
        let mut count = 0;
        for adoption in state.adoptions.iter_mut().filter(|a| {
            a.animal_id == animal_id && a.id != keep_id && a.status != AdoptionStatus::Approved
        }) {
            adoption.status = AdoptionStatus::Cancelled;
            adoption.cancelled_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn delete_adoptions_for_animal(&self, animal_id: &str) -> Result<()> {
        let mut state = self.enter("delete_adoptions_for_animal").await?;
        state.adoptions.retain(|a| a.animal_id != animal_id);
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for MemoryGateway {
    async fn record_audit(&self, entry: &NewAuditEntry) -> Result<()> {
        let mut state = self.enter("record_audit").await?;
        let id = state.next_id("audit");
        state.audits.push(AuditEntry {
            id,
            adoption_id: entry.adoption_id.clone(),
            action: entry.action,
            old_status: entry.old_status,
            new_status: entry.new_status,
            admin_id: entry.admin_id.clone(),
            admin_name: entry.admin_name.clone(),
            admin_email: entry.admin_email.clone(),
            created_at: Some(entry.created_at),
        });
        Ok(())
    }

    async fn delete_audits_for(&self, adoption_ids: &[String]) -> Result<()> {
        let mut state = self.enter("delete_audits_for").await?;
        state.audits.retain(|a| !adoption_ids.contains(&a.adoption_id));
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryGateway {
    async fn find_account_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>> {
        let state = self.enter("find_account_by_credentials").await?;
        Ok(state
            .accounts
            .iter()
            .find(|(account, hash)| account.email.as_deref() == Some(email) && hash == password_hash)
            .map(|(account, _)| account.clone()))
    }

    async fn find_account(&self, id: &str) -> Result<Option<Account>> {
        let state = self.enter("find_account").await?;
        Ok(state
            .accounts
            .iter()
            .find(|(account, _)| account.id == id)
            .map(|(account, _)| account.clone()))
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        let mut state = self.enter("insert_account").await?;
        if state
            .accounts
            .iter()
            .any(|(a, _)| a.email.as_deref() == Some(account.email.as_str()))
        {
            return Err(Error::conflict("e-mail already in use"));
        }
        let id = state.next_id("user");
        let row = Account {
            id,
            name: Some(account.name.clone()),
            email: Some(account.email.clone()),
            role: account.role,
            phone: None,
            city: None,
            address: None,
            photo_url: None,
        };
        state
            .accounts
            .push((row.clone(), account.password_hash.clone()));
        Ok(row)
    }
}

/// In-memory bucket
pub struct MemoryBlobs {
    bucket: String,
    objects: Mutex<BTreeMap<String, Bytes>>,
    failures: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MemoryBlobs {
    pub fn new(bucket: &str) -> Arc<Self> {
        Arc::new(Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn fail(&self, op: &'static str) {
        self.failures.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Store an object directly and return its public URL
    pub fn put(&self, path: &str) -> String {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), Bytes::from_static(b"img"));
        self.public_url(path)
    }

    fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.failures.lock().unwrap().contains(op) {
            return Err(unavailable(op));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, path: &str, data: Bytes, options: FileOptions) -> Result<()> {
        self.enter("upload")?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(path) && !options.upsert {
            return Err(Error::Remote(RemoteError::Unparsed {
                message: "The resource already exists".into(),
                status: StatusCode::CONFLICT,
            }));
        }
        objects.insert(path.to_string(), data);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", PUBLIC_BASE, self.bucket, path)
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        self.enter("remove")?;
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}

pub struct Harness {
    pub app: PetAdoption,
    pub db: Arc<MemoryGateway>,
    pub blobs: Arc<MemoryBlobs>,
}

pub fn harness() -> Harness {
    harness_with(ClientOptions::default())
}

pub fn harness_with(options: ClientOptions) -> Harness {
    init_tracing();
    let db = MemoryGateway::new();
    let blobs = MemoryBlobs::new(&options.bucket);
    let app = PetAdoption::with_backend(db.clone(), blobs.clone(), options);
    Harness { app, db, blobs }
}

fn session(id: &str, role: Role) -> Session {
    Session::new(
        Account {
            id: id.to_string(),
            name: Some(format!("{} name", id)),
            email: Some(format!("{}@shelter.org", id)),
            role,
            phone: None,
            city: None,
            address: None,
            photo_url: None,
        },
        false,
    )
}

pub fn admin() -> Session {
    session("admin-1", Role::Admin)
}

pub fn other_admin() -> Session {
    session("admin-2", Role::Admin)
}

pub fn visitor() -> Session {
    session("user-1", Role::User)
}
