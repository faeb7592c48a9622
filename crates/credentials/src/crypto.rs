//! AES-256-GCM blob encryption.
//!
//! Stored credentials are opaque base64 blobs of `nonce || ciphertext`.
//! The 32-byte key comes from the `ENCRYPTION_KEY` environment variable
//! (base64-encoded) and is owned by whoever constructs the store.

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::CredentialError;

const NONCE_LEN: usize = 12;

/// Symmetric cipher wrapper for credential blobs.
#[derive(Clone)]
pub struct Crypto {
    cipher: Aes256Gcm,
}

impl Crypto {
    /// Build from a base64-encoded 32-byte key.
    pub fn from_key_b64(key_b64: &str) -> Result<Self, CredentialError> {
        let raw = B64
            .decode(key_b64.trim())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        if raw.len() != 32 {
            return Err(CredentialError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                raw.len()
            )));
        }
        Ok(Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&raw)),
        })
    }

    /// Encrypt a plaintext credential into a storable blob.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CredentialError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CredentialError::Decrypt(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(B64.encode(blob))
    }

    /// Decrypt a stored blob back into the plaintext credential.
    pub fn decrypt(&self, blob: &str) -> Result<String, CredentialError> {
        let raw = B64
            .decode(blob.trim())
            .map_err(|e| CredentialError::Decrypt(e.to_string()))?;
        if raw.len() < NONCE_LEN {
            return Err(CredentialError::Decrypt("blob too short".into()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CredentialError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CredentialError::Decrypt(e.to_string()))
    }
}
