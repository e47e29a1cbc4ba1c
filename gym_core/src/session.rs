//! Session establishment and on-disk session records.
//!
//! Records are small JSON files written atomically:
//! 1. Serialize into a temp file in the same directory (exclusively locked)
//! 2. Sync to disk
//! 3. Rename over the original
//!
//! Unreadable or corrupt records are treated as absent, with a warning.

use crate::transport::{decode, Resource, Transport};
use crate::{AuthError, Credentials, Error, RemoteError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

const SESSION_FILE: &str = "session.json";
const PENDING_FILE: &str = "pending_signup.json";

/// Completes authentication and persists whatever the session needs
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<(), AuthError>;
}

/// Authenticated user as persisted after sign-in
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Account created server-side whose sign-in has not completed yet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSignup {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl PendingSignup {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Directory holding the session record and the pending sign-up marker
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.dir.join(PENDING_FILE)
    }

    pub fn load_session(&self) -> Result<Option<StoredSession>> {
        read_record(&self.session_path())
    }

    pub fn save_session(&self, session: &StoredSession) -> Result<()> {
        write_record(&self.session_path(), session)
    }

    /// Returns whether a session was removed
    pub fn clear_session(&self) -> Result<bool> {
        remove_record(&self.session_path())
    }

    pub fn load_pending(&self) -> Result<Option<PendingSignup>> {
        read_record(&self.pending_path())
    }

    pub fn save_pending(&self, pending: &PendingSignup) -> Result<()> {
        write_record(&self.pending_path(), pending)
    }

    pub fn clear_pending(&self) -> Result<bool> {
        remove_record(&self.pending_path())
    }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Treating as absent.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    if let Err(e) = read {
        tracing::warn!("Failed to read {:?}: {}. Treating as absent.", path, e);
        return Ok(None);
    }

    match serde_json::from_str::<T>(&contents) {
        Ok(record) => {
            tracing::debug!("Loaded record from {:?}", path);
            Ok(Some(record))
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Treating as absent.", path, e);
            Ok(None)
        }
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Session(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, record)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved record to {:?}", path);
    Ok(())
}

fn remove_record(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    name: String,
    email: String,
}

/// Signs in through the sessions endpoint and keeps the result in a [`SessionStore`]
pub struct RemoteSessionEstablisher {
    transport: Arc<dyn Transport>,
    store: SessionStore,
}

impl RemoteSessionEstablisher {
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        Self { transport, store }
    }

    /// Re-attach a previously stored session to the transport
    pub fn restore(&self) -> Result<Option<StoredSession>> {
        let session = self.store.load_session()?;
        if let Some(ref s) = session {
            tracing::info!("Restored session for {}", s.user_email);
            self.transport.set_auth_token(Some(s.token.clone()));
        }
        Ok(session)
    }

    pub fn sign_out(&self) -> Result<bool> {
        self.transport.set_auth_token(None);
        self.store.clear_session()
    }
}

#[async_trait]
impl SessionEstablisher for RemoteSessionEstablisher {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<(), AuthError> {
        let resource = Resource::Sessions;
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&credentials)
            .map_err(|e| RemoteError::transport(format!("failed to encode credentials: {}", e)))?;

        let payload = self.transport.post(&resource, body).await?;
        let response: SessionResponse = decode(&resource, payload)?;

        let session = StoredSession {
            token: response.token,
            refresh_token: response.refresh_token,
            user_name: response.user.name,
            user_email: response.user.email,
            signed_in_at: Utc::now(),
        };
        self.store.save_session(&session)?;
        self.transport.set_auth_token(Some(session.token.clone()));

        tracing::info!("Signed in as {}", session.user_email);
        Ok(())
    }
}
