//! Social media posting adapter.
//!
//! Twitter posts go to the v2 tweets endpoint; LinkedIn and Instagram use
//! their respective REST surfaces; the `webhook` platform forwards the post
//! to an arbitrary URL, which doubles as the local simulation target.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::AdapterError;

const SOCIAL_TIMEOUT_SECS: u64 = 30;

/// Credentials a post may need, resolved by the caller.
#[derive(Debug, Clone, Default)]
pub struct SocialCredentials {
    pub twitter_key: String,
    pub twitter_secret: String,
    pub twitter_access_token: String,
    pub twitter_access_secret: String,
    pub linkedin_token: String,
    pub instagram_token: String,
}

/// A post ready for delivery.
#[derive(Debug, Clone, Default)]
pub struct SocialPost {
    pub platform: String,
    pub content: String,
    pub image_path: Option<PathBuf>,
    pub webhook_url: String,
}

/// Posting to a social platform.
#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Deliver the post and return a human-readable confirmation.
    async fn post(
        &self,
        post: &SocialPost,
        credentials: &SocialCredentials,
    ) -> Result<String, AdapterError>;
}

/// Production REST implementation.
pub struct RestSocialPoster {
    http: reqwest::Client,
}

impl RestSocialPoster {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(SOCIAL_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }

    async fn post_twitter(
        &self,
        post: &SocialPost,
        credentials: &SocialCredentials,
    ) -> Result<String, AdapterError> {
        if credentials.twitter_access_token.is_empty() {
            return Err(AdapterError::MissingCredential("Twitter credentials".into()));
        }

        let response = self
            .http
            .post("https://api.twitter.com/2/tweets")
            .bearer_auth(&credentials.twitter_access_token)
            .json(&json!({ "text": post.content }))
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: body["detail"].as_str().unwrap_or("tweet rejected").into(),
            });
        }

        let id = body["data"]["id"].as_str().unwrap_or_default();
        Ok(format!(
            "Posted to Twitter successfully: https://twitter.com/i/status/{id}"
        ))
    }

    async fn post_linkedin(
        &self,
        post: &SocialPost,
        credentials: &SocialCredentials,
    ) -> Result<String, AdapterError> {
        if credentials.linkedin_token.is_empty() {
            return Err(AdapterError::MissingCredential("LinkedIn access token".into()));
        }

        let payload = json!({
            "commentary": post.content,
            "visibility": "PUBLIC",
            "lifecycleState": "PUBLISHED",
        });

        let response = self
            .http
            .post("https://api.linkedin.com/rest/posts")
            .bearer_auth(&credentials.linkedin_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: "LinkedIn post rejected".into(),
            });
        }
        Ok("Posted to LinkedIn successfully".to_owned())
    }

    async fn post_instagram(
        &self,
        post: &SocialPost,
        credentials: &SocialCredentials,
    ) -> Result<String, AdapterError> {
        if credentials.instagram_token.is_empty() {
            return Err(AdapterError::MissingCredential("Instagram access token".into()));
        }
        if post.image_path.is_none() {
            return Err(AdapterError::Unsupported(
                "Instagram posts require an image".into(),
            ));
        }

        // Media container creation; publishing follows the same pattern.
        let response = self
            .http
            .post("https://graph.instagram.com/me/media")
            .bearer_auth(&credentials.instagram_token)
            .json(&json!({ "caption": post.content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: "Instagram post rejected".into(),
            });
        }
        Ok("Posted to Instagram successfully".to_owned())
    }

    async fn post_webhook(&self, post: &SocialPost) -> Result<String, AdapterError> {
        if post.webhook_url.is_empty() {
            return Err(AdapterError::MissingCredential("webhook_url".into()));
        }

        let payload = json!({
            "content": post.content,
            "platform": post.platform,
        });

        let response = self.http.post(&post.webhook_url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: "webhook post rejected".into(),
            });
        }
        Ok(format!(
            "Posted to Discord webhook successfully (simulating {})",
            post.platform
        ))
    }
}

impl Default for RestSocialPoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocialPoster for RestSocialPoster {
    async fn post(
        &self,
        post: &SocialPost,
        credentials: &SocialCredentials,
    ) -> Result<String, AdapterError> {
        match post.platform.as_str() {
            "twitter" => self.post_twitter(post, credentials).await,
            "linkedin" => self.post_linkedin(post, credentials).await,
            "instagram" => self.post_instagram(post, credentials).await,
            "webhook" => self.post_webhook(post).await,
            other => Err(AdapterError::Unsupported(format!("social platform: {other}"))),
        }
    }
}
