//! Image generation adapter (OpenAI and Stability providers).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde_json::json;

use crate::paths;
use crate::AdapterError;

const IMAGE_TIMEOUT_SECS: u64 = 120;
const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
const STABILITY_URL: &str =
    "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image";

/// One generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// `openai` or `stability`.
    pub provider: String,
    /// `WIDTHxHEIGHT`, e.g. `1024x1024`.
    pub size: String,
    pub quality: String,
    pub openai_key: String,
    pub stability_key: String,
}

/// Producing a PNG on disk from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image and return the local file path.
    async fn generate(&self, request: &ImageRequest) -> Result<PathBuf, AdapterError>;
}

/// Production REST implementation.
pub struct RestImageGenerator {
    http: reqwest::Client,
}

impl RestImageGenerator {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(IMAGE_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }

    async fn generate_openai(&self, request: &ImageRequest) -> Result<PathBuf, AdapterError> {
        if request.openai_key.is_empty() {
            return Err(AdapterError::MissingCredential("OpenAI API key not configured".into()));
        }

        let payload = json!({
            "model": "dall-e-3",
            "prompt": request.prompt,
            "n": 1,
            "size": request.size,
            "quality": request.quality,
            "response_format": "b64_json",
        });

        let response = self
            .http
            .post(OPENAI_IMAGES_URL)
            .bearer_auth(&request.openai_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: format!("OpenAI API request failed ({})", status.as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let b64 = body["data"][0]["b64_json"]
            .as_str()
            .ok_or_else(|| AdapterError::Parse("No image data in OpenAI response".into()))?;
        self.write_png("openai", b64)
    }

    async fn generate_stability(&self, request: &ImageRequest) -> Result<PathBuf, AdapterError> {
        if request.stability_key.is_empty() {
            return Err(AdapterError::MissingCredential(
                "Stability AI API key not configured".into(),
            ));
        }

        let (width, height) = parse_size(&request.size);
        let payload = json!({
            "text_prompts": [{ "text": request.prompt }],
            "width": width,
            "height": height,
            "samples": 1,
        });

        let response = self
            .http
            .post(STABILITY_URL)
            .bearer_auth(&request.stability_key)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: format!("Stability AI API request failed ({})", status.as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let b64 = body["artifacts"][0]["base64"]
            .as_str()
            .ok_or_else(|| AdapterError::Parse("No image data in Stability AI response".into()))?;
        self.write_png("stability", b64)
    }

    fn write_png(&self, provider: &str, b64: &str) -> Result<PathBuf, AdapterError> {
        let bytes = B64
            .decode(b64)
            .map_err(|e| AdapterError::Parse(format!("invalid image payload: {e}")))?;
        let dir = paths::ensure_dir(paths::IMAGES_DIR)?;
        let target = dir.join(paths::unique_file_name(provider, "png"));
        std::fs::write(&target, bytes)?;
        Ok(target)
    }
}

impl Default for RestImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for RestImageGenerator {
    async fn generate(&self, request: &ImageRequest) -> Result<PathBuf, AdapterError> {
        match request.provider.as_str() {
            "openai" => self.generate_openai(request).await,
            "stability" => self.generate_stability(request).await,
            other => Err(AdapterError::Unsupported(format!("image provider: {other}"))),
        }
    }
}

fn parse_size(size: &str) -> (u32, u32) {
    size.split_once('x')
        .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
        .unwrap_or((1024, 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parsing_falls_back_to_default() {
        assert_eq!(parse_size("512x768"), (512, 768));
        assert_eq!(parse_size("not-a-size"), (1024, 1024));
    }
}
