//! Credential Storage Infrastructure
//!
//! Persistent key/value storage for the bearer token and display nickname,
//! surviving restarts the way browser local storage survives a reload.
//! The two values are written together and cleared together; reconciling a
//! half-written state is the session layer's job, not ours.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Error raised by credential storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Persistent credential storage
///
/// The sole owner of this store is the session layer; the HTTP layer only
/// reads the token through [`crate::http::TokenSource`].
pub trait CredentialStore: Send + Sync {
    /// Read the persisted bearer token
    fn token(&self) -> Option<String>;

    /// Read the persisted display nickname
    fn nickname(&self) -> Option<String>;

    /// Persist token and nickname together
    fn store(&self, token: &str, nickname: &str) -> Result<(), StorageError>;

    /// Remove both persisted values
    fn clear(&self) -> Result<(), StorageError>;
}

/// On-disk document holding the two persisted keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

impl Persisted {
    fn is_empty(&self) -> bool {
        self.token.is_none() && self.nickname.is_none()
    }
}

/// File-backed credential store
///
/// A single JSON document on disk, read once at open and written through on
/// every mutation. Writes go to a sibling temp file first and are renamed
/// into place so a crash mid-write never leaves a torn document.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cache: Mutex<Persisted>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any previously persisted values
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// also treated as empty (fail closed): the stale document is left in
    /// place and overwritten by the next `store` or `clear`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Persisted>(&bytes) {
                Ok(persisted) => persisted,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "credential file is corrupt, starting empty"
                    );
                    Persisted::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Persisted::default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "credential file is unreadable, starting empty"
                );
                Persisted::default()
            }
        };

        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Persisted> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn write_file(&self, persisted: &Persisted) -> Result<(), StorageError> {
        if persisted.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }

        let bytes = serde_json::to_vec_pretty(persisted)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn nickname(&self) -> Option<String> {
        self.lock().nickname.clone()
    }

    fn store(&self, token: &str, nickname: &str) -> Result<(), StorageError> {
        let mut cache = self.lock();
        cache.token = Some(token.to_string());
        cache.nickname = Some(nickname.to_string());
        self.write_file(&cache)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut cache = self.lock();
        cache.token = None;
        cache.nickname = None;
        self.write_file(&cache)
    }
}

/// In-memory credential store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Persisted>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with arbitrary (possibly inconsistent) contents
    ///
    /// Test support: lets startup reconciliation be exercised against
    /// states the regular API cannot produce, such as a token without a
    /// nickname.
    pub fn seed(&self, token: Option<&str>, nickname: Option<&str>) {
        let mut inner = self.lock();
        inner.token = token.map(str::to_string);
        inner.nickname = nickname.map(str::to_string);
    }

    fn lock(&self) -> MutexGuard<'_, Persisted> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn nickname(&self) -> Option<String> {
        self.lock().nickname.clone()
    }

    fn store(&self, token: &str, nickname: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.token = Some(token.to_string());
        inner.nickname = Some(nickname.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.token = None;
        inner.nickname = None;
        Ok(())
    }
}
