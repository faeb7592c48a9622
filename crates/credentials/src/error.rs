//! Credential-layer error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The stored blob could not be decoded or decrypted.
    #[error("failed to decrypt credential: {0}")]
    Decrypt(String),

    /// The encryption key material is missing or malformed.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// The backing store could not be read.
    #[error("credential store error: {0}")]
    Store(String),
}
