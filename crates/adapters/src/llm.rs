//! LLM router client.
//!
//! All AI node kinds route through one chat-completions endpoint; the model
//! string selects the upstream provider. The production implementation talks
//! to OpenRouter.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::AdapterError;

const LLM_TIMEOUT_SECS: u64 = 60;
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// API keys available to a completion call.
#[derive(Debug, Clone, Default)]
pub struct LlmKeys {
    pub openrouter: String,
    pub openai: String,
}

/// A single-method chat completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run `prompt` against `model` and return the completion text.
    async fn complete(&self, prompt: &str, model: &str, keys: &LlmKeys)
        -> Result<String, AdapterError>;
}

/// OpenRouter-backed implementation.
pub struct OpenRouterClient {
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for OpenRouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        keys: &LlmKeys,
    ) -> Result<String, AdapterError> {
        let api_key = if keys.openrouter.is_empty() {
            &keys.openai
        } else {
            &keys.openrouter
        };
        if api_key.is_empty() {
            return Err(AdapterError::MissingCredential(
                "OPENROUTER_API_KEY not found in environment variables".into(),
            ));
        }

        let payload = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model, prompt_len = prompt.len(), "dispatching completion");

        let response = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(api_key)
            .header("X-Title", "AutoFlow Studio")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout { seconds: LLM_TIMEOUT_SECS }
                } else {
                    AdapterError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                401 => "Authentication failed - Invalid API key".to_owned(),
                429 => "Rate limit exceeded".to_owned(),
                code => format!("HTTP {code}"),
            };
            return Err(AdapterError::Api { status: status.as_u16(), message });
        }

        let body: serde_json::Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::Parse("no completion in response".into()))
    }
}
