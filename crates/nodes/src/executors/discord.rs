//! Discord notification executor.
//!
//! Builds up to ten embeds from the node's own message plus the predecessor
//! results, with a fixed color per result kind.

use std::path::Path;
use std::sync::Arc;

use adapters::{DiscordClient, DiscordEmbed, DiscordMessage};
use async_trait::async_trait;
use credentials::ServiceKey;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

const MAX_EMBEDS: usize = 10;
const EMBED_DESCRIPTION_LIMIT: usize = 1_500;

const COLOR_MAIN: u32 = 5_814_783;
const COLOR_REPORT: u32 = 3_066_993;
const COLOR_DOCUMENT: u32 = 3_447_003;
const COLOR_IMAGE: u32 = 10_181_046;
const COLOR_AI: u32 = 5_814_783;
const COLOR_NOTIFICATION: u32 = 3_066_993;
const COLOR_ERROR: u32 = 15_158_332;

pub struct DiscordExecutor {
    client: Arc<dyn DiscordClient>,
}

impl DiscordExecutor {
    pub fn new(client: Arc<dyn DiscordClient>) -> Self {
        Self { client }
    }

    fn embed_for_result(source_id: &str, result: &NodeResult) -> Option<DiscordEmbed> {
        let embed = match result {
            NodeResult::ReportGenerated { path } => DiscordEmbed {
                title: "Report Generated".into(),
                description: format!("Report created: {}", file_name(path)),
                color: COLOR_REPORT,
                footer: None,
            },
            NodeResult::DocumentParsed { .. } => DiscordEmbed {
                title: "Document Processed".into(),
                description: "Document has been parsed and analyzed".into(),
                color: COLOR_DOCUMENT,
                footer: None,
            },
            NodeResult::ImageGenerated { path } => DiscordEmbed {
                title: "Generated Image".into(),
                description: format!("Image created: {}", file_name(path)),
                color: COLOR_IMAGE,
                footer: None,
            },
            NodeResult::FileUploaded { url } => DiscordEmbed {
                title: "File Uploaded".into(),
                description: url.clone(),
                color: COLOR_NOTIFICATION,
                footer: None,
            },
            NodeResult::Error(message) => DiscordEmbed {
                title: "Node Error".into(),
                description: message.clone(),
                color: COLOR_ERROR,
                footer: None,
            },
            other => {
                let text = other.ai_text()?;
                DiscordEmbed {
                    title: format!("{} Response", adapter::model_for_source(source_id)),
                    description: text.to_owned(),
                    color: COLOR_AI,
                    footer: None,
                }
            }
        };

        Some(DiscordEmbed {
            description: clamp_description(&embed.description),
            ..embed
        })
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned())
}

fn clamp_description(text: &str) -> String {
    if text.chars().count() > EMBED_DESCRIPTION_LIMIT {
        let mut clamped: String = text.chars().take(EMBED_DESCRIPTION_LIMIT).collect();
        clamped.push_str("...");
        clamped
    } else {
        text.to_owned()
    }
}

#[async_trait]
impl NodeExecutor for DiscordExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        // A user's stored webhook (or its env fallback) overrides the node's
        // own URL; userless runs use the configured one.
        let mut webhook_url = match ctx.broker {
            Some(broker) => broker.resolve(ServiceKey::Discord).await,
            None => String::new(),
        };
        if webhook_url.is_empty() {
            webhook_url = ctx.config_str("webhook_url").unwrap_or_default().to_owned();
        }
        if webhook_url.is_empty() {
            return NodeResult::error("Discord webhook URL is required");
        }

        let message_text = ctx.config_str("message").unwrap_or_default();
        let mut embeds = Vec::new();
        if !message_text.is_empty() {
            embeds.push(DiscordEmbed {
                title: "AutoFlow Workflow Results".into(),
                description: clamp_description(message_text),
                color: COLOR_MAIN,
                footer: Some("Sent via AutoFlow".into()),
            });
        }
        for (source_id, result) in ctx.predecessors {
            if let Some(embed) = Self::embed_for_result(source_id, result) {
                embeds.push(embed);
            }
        }
        embeds.truncate(MAX_EMBEDS);

        let message = DiscordMessage {
            content: message_text.to_owned(),
            username: ctx.config_str_or("username", "AutoFlow Bot").to_owned(),
            embeds,
        };

        match self.client.post(&webhook_url, &message).await {
            Ok(()) => NodeResult::Notification("Discord message sent successfully".into()),
            Err(e) => NodeResult::error(e),
        }
    }
}
