//! Per-run credential broker.
//!
//! Resolution order for every service key:
//! 1. decrypted value from the user's credential record,
//! 2. process environment under the fixed mapping below,
//! 3. empty string.
//!
//! Resolved values are cached for the broker's lifetime (one engine run),
//! so rotating a key takes effect on the next run without a stale cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::store::CredentialStore;

/// Every service credential the executors can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    OpenAi,
    OpenRouter,
    Google,
    Discord,
    Stability,
    Github,
    TwilioSid,
    TwilioToken,
    TwilioPhone,
    TwitterApiKey,
    TwitterApiSecret,
    TwitterAccessToken,
    TwitterAccessSecret,
    Linkedin,
    Instagram,
}

impl ServiceKey {
    /// Tag under which the value is stored in a user's credential record.
    pub fn record_key(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Google => "google",
            Self::Discord => "discord",
            Self::Stability => "stability",
            Self::Github => "github",
            Self::TwilioSid => "twilio_sid",
            Self::TwilioToken => "twilio_token",
            Self::TwilioPhone => "twilio_phone",
            Self::TwitterApiKey => "twitter_api_key",
            Self::TwitterApiSecret => "twitter_api_secret",
            Self::TwitterAccessToken => "twitter_access_token",
            Self::TwitterAccessSecret => "twitter_access_token_secret",
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
        }
    }

    /// Environment variable consulted when the user record has no value.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Google => "GOOGLE_API_KEY",
            Self::Discord => "SOCIAL_MEDIA_TEST_WEBHOOK",
            Self::Stability => "STABILITY_API_KEY",
            Self::Github => "GITHUB_TOKEN",
            Self::TwilioSid => "TWILIO_ACCOUNT_SID",
            Self::TwilioToken => "TWILIO_AUTH_TOKEN",
            Self::TwilioPhone => "TWILIO_PHONE_NUMBER",
            Self::TwitterApiKey => "TWITTER_API_KEY",
            Self::TwitterApiSecret => "TWITTER_API_SECRET",
            Self::TwitterAccessToken => "TWITTER_ACCESS_TOKEN",
            Self::TwitterAccessSecret => "TWITTER_ACCESS_TOKEN_SECRET",
            Self::Linkedin => "LINKEDIN_ACCESS_TOKEN",
            Self::Instagram => "INSTAGRAM_ACCESS_TOKEN",
        }
    }
}

/// Twilio credential triple.
#[derive(Debug, Clone, Default)]
pub struct TwilioCredentials {
    pub sid: String,
    pub token: String,
    pub phone: String,
}

impl TwilioCredentials {
    pub fn is_complete(&self) -> bool {
        !self.sid.is_empty() && !self.token.is_empty() && !self.phone.is_empty()
    }
}

/// Twitter OAuth 1.0a credential quad.
#[derive(Debug, Clone, Default)]
pub struct TwitterCredentials {
    pub key: String,
    pub secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl TwitterCredentials {
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty()
            && !self.secret.is_empty()
            && !self.access_token.is_empty()
            && !self.access_secret.is_empty()
    }
}

/// Run-scoped credential resolver. Construct one per engine run.
pub struct CredentialBroker {
    store: Arc<dyn CredentialStore>,
    user_id: String,
    /// User record fetched lazily on first resolve; `None` until then.
    record: Mutex<Option<HashMap<String, String>>>,
    cache: Mutex<HashMap<ServiceKey, String>>,
}

impl CredentialBroker {
    pub fn new(store: Arc<dyn CredentialStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            record: Mutex::new(None),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn openai(&self) -> String {
        self.resolve(ServiceKey::OpenAi).await
    }

    pub async fn openrouter(&self) -> String {
        self.resolve(ServiceKey::OpenRouter).await
    }

    pub async fn google(&self) -> String {
        self.resolve(ServiceKey::Google).await
    }

    /// Discord webhook URL (not a token).
    pub async fn discord(&self) -> String {
        self.resolve(ServiceKey::Discord).await
    }

    pub async fn stability(&self) -> String {
        self.resolve(ServiceKey::Stability).await
    }

    pub async fn github(&self) -> String {
        self.resolve(ServiceKey::Github).await
    }

    pub async fn linkedin(&self) -> String {
        self.resolve(ServiceKey::Linkedin).await
    }

    pub async fn instagram(&self) -> String {
        self.resolve(ServiceKey::Instagram).await
    }

    pub async fn twilio(&self) -> TwilioCredentials {
        TwilioCredentials {
            sid: self.resolve(ServiceKey::TwilioSid).await,
            token: self.resolve(ServiceKey::TwilioToken).await,
            phone: self.resolve(ServiceKey::TwilioPhone).await,
        }
    }

    pub async fn twitter(&self) -> TwitterCredentials {
        TwitterCredentials {
            key: self.resolve(ServiceKey::TwitterApiKey).await,
            secret: self.resolve(ServiceKey::TwitterApiSecret).await,
            access_token: self.resolve(ServiceKey::TwitterAccessToken).await,
            access_secret: self.resolve(ServiceKey::TwitterAccessSecret).await,
        }
    }

    /// Resolve a single service key through the record → env → empty chain.
    pub async fn resolve(&self, key: ServiceKey) -> String {
        if let Some(cached) = self.cache.lock().await.get(&key) {
            return cached.clone();
        }

        let value = self.resolve_uncached(key).await;
        self.cache.lock().await.insert(key, value.clone());
        value
    }

    async fn resolve_uncached(&self, key: ServiceKey) -> String {
        // 1. User's stored credential.
        let record = self.fetch_record().await;
        if let Some(blob) = record.get(key.record_key()) {
            match self.store.decrypt(blob) {
                Ok(value) if !value.is_empty() => return value,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        user_id = %self.user_id,
                        service = key.record_key(),
                        "failed to decrypt stored credential: {e}"
                    );
                }
            }
        }

        // 2. Process environment fallback.
        std::env::var(key.env_var()).unwrap_or_default()
    }

    async fn fetch_record(&self) -> HashMap<String, String> {
        let mut record = self.record.lock().await;
        if record.is_none() {
            let fetched = match self.store.get(&self.user_id).await {
                Ok(map) => map,
                Err(e) => {
                    warn!(user_id = %self.user_id, "credential store read failed: {e}");
                    HashMap::new()
                }
            };
            *record = Some(fetched);
        }
        record.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Crypto, InMemoryCredentialStore};
    use base64::engine::general_purpose::STANDARD as B64;
    use base64::Engine;

    fn store_with(user: &str, entries: &[(&str, &str)]) -> Arc<InMemoryCredentialStore> {
        let crypto = Crypto::from_key_b64(&B64.encode([3u8; 32])).unwrap();
        let store = InMemoryCredentialStore::new(crypto);
        for (service, value) in entries {
            store.insert(user, service, value).unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn stored_credential_wins_over_env() {
        let store = store_with("u1", &[("openai", "sk-user-key")]);
        let broker = CredentialBroker::new(store, "u1");
        assert_eq!(broker.openai().await, "sk-user-key");
    }

    #[tokio::test]
    async fn unknown_user_falls_back_to_env_or_empty() {
        let store = store_with("someone-else", &[]);
        let broker = CredentialBroker::new(store, "u2");
        // No stored record and (in tests) no TWILIO_ACCOUNT_SID either.
        let twilio = broker.twilio().await;
        assert!(!twilio.is_complete());
    }

    #[tokio::test]
    async fn values_are_cached_per_broker() {
        let store = store_with("u1", &[("discord", "https://hook.example/1")]);
        let broker = CredentialBroker::new(store.clone(), "u1");
        assert_eq!(broker.discord().await, "https://hook.example/1");

        // Rotate the stored value; the broker must keep serving the cached one.
        store.insert("u1", "discord", "https://hook.example/2").unwrap();
        assert_eq!(broker.discord().await, "https://hook.example/1");

        // A fresh broker (next run) sees the rotated credential.
        let fresh = CredentialBroker::new(store, "u1");
        assert_eq!(fresh.discord().await, "https://hook.example/2");
    }

    #[tokio::test]
    async fn twitter_quad_resolves_as_a_unit() {
        let store = store_with(
            "u1",
            &[
                ("twitter_api_key", "k"),
                ("twitter_api_secret", "s"),
                ("twitter_access_token", "at"),
                ("twitter_access_token_secret", "as"),
            ],
        );
        let broker = CredentialBroker::new(store, "u1");
        let tw = broker.twitter().await;
        assert!(tw.is_complete());
        assert_eq!(tw.access_secret, "as");
    }
}
