//! Account login, registration and profile lookup
//!
//! Accounts live in the `users` collection with a hex SHA-256 digest of the
//! password. This is a convenience login for a small shelter site, not a
//! secure authentication scheme.

mod session;

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{Account, NewAccount, Role};

pub use session::*;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Demo credentials accepted only when fallback login is enabled
struct FallbackAccount {
    login: &'static str,
    password: &'static str,
    id: &'static str,
    name: &'static str,
    email: &'static str,
    role: Role,
}

static FALLBACK_ACCOUNTS: [FallbackAccount; 2] = [
    FallbackAccount {
        login: "admin",
        password: "1234",
        id: "local-admin",
        name: "Admin",
        email: "admin@local",
        role: Role::Admin,
    },
    FallbackAccount {
        login: "usuario",
        password: "4321",
        id: "local-user",
        name: "Usuário",
        email: "user@local",
        role: Role::User,
    },
];

/// Hex encoded SHA-256 digest of a password
pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Sign-up form
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

impl Registration {
    /// Checks the form and returns the account to insert
    fn validate(&self) -> Result<NewAccount> {
        let name = self.name.trim();
        let email = self.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(Error::validation("fill in every field"));
        }
        if self.password != self.confirmation {
            return Err(Error::validation("passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "the password must have at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(NewAccount {
            name: name.to_string(),
            email,
            password_hash: password_hash(&self.password),
            role: Role::User,
        })
    }
}

/// Login and registration against the `users` collection
#[derive(Clone)]
pub struct Accounts {
    gateway: Arc<dyn Gateway>,
    allow_fallback: bool,
}

impl Accounts {
    pub fn new(gateway: Arc<dyn Gateway>, allow_fallback: bool) -> Self {
        Self {
            gateway,
            allow_fallback,
        }
    }

    /// Sign in with an e-mail and password
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::validation("enter your e-mail and password"));
        }

        let hash = password_hash(password);
        match self.gateway.find_account_by_credentials(email, &hash).await {
            Ok(Some(account)) => {
                info!(account_id = %account.id, role = ?account.role, "signed in");
                return Ok(Session::new(account, false));
            }
            Ok(None) => debug!("no account matches the credentials"),
            Err(e) if self.allow_fallback => {
                warn!(error = %e, "account lookup failed, trying demo credentials");
            }
            Err(e) => return Err(e),
        }

        if let Some(session) = self.fallback_session(email, password) {
            return Ok(session);
        }
        Err(Error::Authentication("invalid e-mail or password".to_string()))
    }

    fn fallback_session(&self, login: &str, password: &str) -> Option<Session> {
        if !self.allow_fallback {
            return None;
        }
        let demo = FALLBACK_ACCOUNTS
            .iter()
            .find(|demo| demo.login == login && demo.password == password)?;
        warn!(account_id = demo.id, "signed in with demo credentials");
        Some(Session::new(
            Account {
                id: demo.id.to_string(),
                name: Some(demo.name.to_string()),
                email: Some(demo.email.to_string()),
                role: demo.role,
                phone: None,
                city: None,
                address: None,
                photo_url: None,
            },
            true,
        ))
    }

    /// Create a user account and sign it in
    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        let account = registration.validate()?;
        let created = self.gateway.insert_account(&account).await?;
        info!(account_id = %created.id, "account registered");
        Ok(Session::new(created, false))
    }

    /// Latest stored profile for the session, or the session copy when the
    /// lookup fails
    pub async fn profile(&self, session: &Session) -> Account {
        match self.gateway.find_account(&session.account.id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(account_id = %session.account.id, "no stored profile, using session copy");
                session.account.clone()
            }
            Err(e) => {
                warn!(account_id = %session.account.id, error = %e, "profile lookup failed");
                session.account.clone()
            }
        }
    }
}
