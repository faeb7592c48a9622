//! Discord webhook adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AdapterError;

const DISCORD_TIMEOUT_SECS: u64 = 10;

/// One embed block in a Discord message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// A webhook post: plain content plus up to ten embeds.
#[derive(Debug, Clone, Default)]
pub struct DiscordMessage {
    pub content: String,
    pub username: String,
    pub embeds: Vec<DiscordEmbed>,
}

/// Posting to a Discord webhook URL.
#[async_trait]
pub trait DiscordClient: Send + Sync {
    async fn post(&self, webhook_url: &str, message: &DiscordMessage) -> Result<(), AdapterError>;
}

/// Production implementation.
pub struct DiscordWebhookClient {
    http: reqwest::Client,
}

impl DiscordWebhookClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(DISCORD_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for DiscordWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscordClient for DiscordWebhookClient {
    async fn post(&self, webhook_url: &str, message: &DiscordMessage) -> Result<(), AdapterError> {
        let embeds: Vec<serde_json::Value> = message
            .embeds
            .iter()
            .map(|e| {
                let mut embed = json!({
                    "title": e.title,
                    "description": e.description,
                    "color": e.color,
                });
                if let Some(footer) = &e.footer {
                    embed["footer"] = json!({ "text": footer });
                }
                embed
            })
            .collect();

        let payload = json!({
            "content": message.content,
            "username": message.username,
            "embeds": embeds,
        });

        let response = self.http.post(webhook_url).json(&payload).send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout { seconds: DISCORD_TIMEOUT_SECS }
            } else {
                AdapterError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(())
    }
}
