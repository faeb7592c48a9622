//! Image generation executor.
//!
//! With no configured prompt, the first non-error free-form predecessor
//! result is used, trimmed to 500 characters.

use std::sync::Arc;

use adapters::{ImageGenerator, ImageRequest};
use async_trait::async_trait;
use credentials::ServiceKey;

use crate::{NodeContext, NodeExecutor, NodeResult};

const PROMPT_LIMIT: usize = 500;
const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_QUALITY: &str = "standard";

pub struct ImageGenerationExecutor {
    generator: Arc<dyn ImageGenerator>,
}

impl ImageGenerationExecutor {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    fn resolve_prompt(ctx: &NodeContext<'_>) -> Option<String> {
        if let Some(prompt) = ctx.config_str("prompt").filter(|p| !p.is_empty()) {
            return Some(prompt.to_owned());
        }
        ctx.predecessors
            .iter()
            .find_map(|(_, result)| result.ai_text())
            .map(|text| text.trim().chars().take(PROMPT_LIMIT).collect())
    }
}

#[async_trait]
impl NodeExecutor for ImageGenerationExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let Some(prompt) = Self::resolve_prompt(ctx) else {
            return NodeResult::error("Image prompt is required");
        };

        let request = ImageRequest {
            prompt,
            provider: ctx.config_str_or("provider", "openai").to_owned(),
            size: ctx.config_str_or("size", DEFAULT_SIZE).to_owned(),
            quality: ctx.config_str_or("quality", DEFAULT_QUALITY).to_owned(),
            openai_key: ctx.credential(ServiceKey::OpenAi).await,
            stability_key: ctx.credential(ServiceKey::Stability).await,
        };

        match self.generator.generate(&request).await {
            Ok(path) => NodeResult::ImageGenerated { path: path.to_string_lossy().into_owned() },
            Err(e) => NodeResult::error(e),
        }
    }
}
