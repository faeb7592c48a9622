//! Social media executor.
//!
//! Absorbs AI text (truncated to the platform's limit) into the post and
//! uses a generated-image predecessor as the post's image.

use std::path::PathBuf;
use std::sync::Arc;

use adapters::{SocialCredentials, SocialPost, SocialPoster};
use async_trait::async_trait;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

pub struct SocialMediaExecutor {
    poster: Arc<dyn SocialPoster>,
}

impl SocialMediaExecutor {
    pub fn new(poster: Arc<dyn SocialPoster>) -> Self {
        Self { poster }
    }
}

/// Hard content limits per platform.
fn platform_limit(platform: &str) -> usize {
    match platform {
        "twitter" => 280,
        "instagram" => 2_200,
        "linkedin" => 3_000,
        _ => 2_000,
    }
}

#[async_trait]
impl NodeExecutor for SocialMediaExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let platform = ctx.config_str_or("platform", "webhook").to_owned();
        let limit = platform_limit(&platform);

        let mut content = ctx.config_str("content").unwrap_or_default().to_owned();
        if content.is_empty() {
            if let Some(text) = ctx.predecessors.iter().find_map(|(_, r)| r.ai_text()) {
                content = text.trim().to_owned();
            }
        }
        if content.is_empty() {
            return NodeResult::error("Post content is required");
        }
        content = adapter::truncate_chars(&content, limit);

        let image_path = ctx
            .predecessors
            .iter()
            .find_map(|(_, result)| match result {
                NodeResult::ImageGenerated { path } => Some(PathBuf::from(path)),
                _ => None,
            })
            .or_else(|| {
                ctx.config_str("image_path")
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
            });

        let credentials = match ctx.broker {
            Some(broker) => {
                let twitter = broker.twitter().await;
                SocialCredentials {
                    twitter_key: twitter.key,
                    twitter_secret: twitter.secret,
                    twitter_access_token: twitter.access_token,
                    twitter_access_secret: twitter.access_secret,
                    linkedin_token: broker.linkedin().await,
                    instagram_token: broker.instagram().await,
                }
            }
            None => SocialCredentials {
                twitter_key: std::env::var("TWITTER_API_KEY").unwrap_or_default(),
                twitter_secret: std::env::var("TWITTER_API_SECRET").unwrap_or_default(),
                twitter_access_token: std::env::var("TWITTER_ACCESS_TOKEN").unwrap_or_default(),
                twitter_access_secret: std::env::var("TWITTER_ACCESS_TOKEN_SECRET")
                    .unwrap_or_default(),
                linkedin_token: std::env::var("LINKEDIN_ACCESS_TOKEN").unwrap_or_default(),
                instagram_token: std::env::var("INSTAGRAM_ACCESS_TOKEN").unwrap_or_default(),
            },
        };

        let post = SocialPost {
            platform,
            content,
            image_path,
            webhook_url: ctx.config_str("webhook_url").unwrap_or_default().to_owned(),
        };

        match self.poster.post(&post, &credentials).await {
            Ok(confirmation) => NodeResult::Notification(confirmation),
            Err(e) => NodeResult::error(e),
        }
    }
}
