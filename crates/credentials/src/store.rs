//! The `CredentialStore` trait — the vault interface the broker consumes.
//!
//! The real vault (per-user encrypted rows) lives outside this workspace;
//! the broker only needs `get` + `decrypt`. The in-memory implementation
//! here backs tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{CredentialError, Crypto};

/// Read access to per-user encrypted service credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the user's credential record: service tag → encrypted blob.
    ///
    /// An unknown user yields an empty map, not an error.
    async fn get(&self, user_id: &str) -> Result<HashMap<String, String>, CredentialError>;

    /// Decrypt a single stored blob.
    fn decrypt(&self, blob: &str) -> Result<String, CredentialError>;
}

/// Store with no user records at all; the broker's environment fallback
/// does the whole job. Used when no vault is wired in.
pub struct EnvOnlyCredentialStore;

#[async_trait]
impl CredentialStore for EnvOnlyCredentialStore {
    async fn get(&self, _user_id: &str) -> Result<HashMap<String, String>, CredentialError> {
        Ok(HashMap::new())
    }

    fn decrypt(&self, _blob: &str) -> Result<String, CredentialError> {
        Err(CredentialError::Store("no credential vault configured".into()))
    }
}

/// In-memory credential store keyed by user id.
pub struct InMemoryCredentialStore {
    crypto: Crypto,
    records: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl InMemoryCredentialStore {
    pub fn new(crypto: Crypto) -> Self {
        Self {
            crypto,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Encrypt and store a credential for a user.
    pub fn insert(
        &self,
        user_id: &str,
        service: &str,
        plaintext: &str,
    ) -> Result<(), CredentialError> {
        let blob = self.crypto.encrypt(plaintext)?;
        self.records
            .lock()
            .unwrap()
            .entry(user_id.to_owned())
            .or_default()
            .insert(service.to_owned(), blob);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, user_id: &str) -> Result<HashMap<String, String>, CredentialError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn decrypt(&self, blob: &str) -> Result<String, CredentialError> {
        self.crypto.decrypt(blob)
    }
}
