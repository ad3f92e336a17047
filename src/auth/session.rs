//! Session management for authentication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Account, AdminSnapshot, Role};

/// The signed-in account, passed explicitly to every privileged call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub account: Account,

    pub signed_in_at: DateTime<Utc>,

    /// Whether the account came from the built-in demo credentials
    #[serde(default)]
    pub fallback: bool,
}

impl Session {
    pub fn new(account: Account, fallback: bool) -> Self {
        Self {
            account,
            signed_in_at: Utc::now(),
            fallback,
        }
    }

    pub fn role(&self) -> Role {
        self.account.role
    }

    pub fn is_admin(&self) -> bool {
        self.account.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the session belongs to an admin
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden(format!("only administrators may {}", action)))
        }
    }

    /// Admin details copied onto approval and audit rows
    pub fn admin_snapshot(&self) -> AdminSnapshot {
        AdminSnapshot {
            id: Some(self.account.id.clone()),
            name: self.account.name.clone(),
            email: self.account.email.clone(),
        }
    }
}

/// A session persisted as JSON on the local disk
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, body).await?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// The stored session, or `None` when nobody is signed in
    pub async fn load(&self) -> Result<Option<Session>> {
        match tokio::fs::read(&self.path).await {
            Ok(body) => Ok(Some(serde_json::from_slice(&body)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sign out; a missing file is not an error
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
