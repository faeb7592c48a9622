//! `credentials` crate — per-run credential resolution for external services.
//!
//! The engine constructs one [`CredentialBroker`] per execution run. Each
//! accessor resolves in order: the user's stored (encrypted) credential
//! record, then a fixed process-environment fallback, then empty. Resolved
//! values are cached for the broker's lifetime so a run never decrypts the
//! same blob twice.

pub mod broker;
pub mod crypto;
pub mod error;
pub mod store;

pub use broker::{CredentialBroker, ServiceKey, TwilioCredentials, TwitterCredentials};
pub use crypto::Crypto;
pub use error::CredentialError;
pub use store::{CredentialStore, EnvOnlyCredentialStore, InMemoryCredentialStore};
