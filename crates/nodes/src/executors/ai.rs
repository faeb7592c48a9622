//! AI node executor (`gpt`, `llama`, `gemini`, `claude`, `mistral`).
//!
//! All five kinds route through the shared LLM client; the node's `model`
//! option picks the upstream model.

use std::sync::Arc;

use adapters::{LlmClient, LlmKeys};
use async_trait::async_trait;
use credentials::ServiceKey;
use tracing::debug;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

pub const DEFAULT_MODEL: &str = "meta-llama/llama-3-8b-instruct";

pub struct AiExecutor {
    llm: Arc<dyn LlmClient>,
}

impl AiExecutor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Prompt from config (`prompt`, falling back to `label`), enriched with
    /// the content of every parsed-document predecessor in order.
    fn build_prompt(ctx: &NodeContext<'_>) -> String {
        let mut prompt = ctx
            .config_str("prompt")
            .filter(|p| !p.is_empty())
            .or_else(|| ctx.config_str("label"))
            .unwrap_or_default()
            .to_owned();

        for (_, document) in adapter::documents(ctx.predecessors) {
            if !document.content.is_empty() {
                prompt.push_str("\n\nDocument content to analyze:\n");
                prompt.push_str(&document.content);
            }
        }

        prompt
    }
}

#[async_trait]
impl NodeExecutor for AiExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let prompt = Self::build_prompt(ctx);
        if prompt.trim().is_empty() {
            return NodeResult::error("No prompt provided for AI node");
        }

        let model = ctx.config_str_or("model", DEFAULT_MODEL);
        let keys = LlmKeys {
            openrouter: ctx.credential(ServiceKey::OpenRouter).await,
            openai: ctx.credential(ServiceKey::OpenAi).await,
        };

        debug!(node_id = ctx.node_id, model, "running completion");
        match self.llm.complete(&prompt, model, &keys).await {
            Ok(completion) => NodeResult::AiText(completion),
            Err(e) => NodeResult::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::mock::MockLlm;
    use serde_json::json;
    use std::io::Write as _;

    fn ctx<'a>(
        config: &'a serde_json::Value,
        predecessors: &'a [(String, NodeResult)],
    ) -> NodeContext<'a> {
        NodeContext { node_id: "gpt-1", config, predecessors, broker: None }
    }

    #[tokio::test]
    async fn prompt_and_default_model_reach_the_client() {
        let llm = Arc::new(MockLlm::returning("HELLO SUMMARY"));
        let executor = AiExecutor::new(llm.clone());
        let config = json!({ "prompt": "Summarise: hello" });

        let result = executor.execute(&ctx(&config, &[])).await;
        assert_eq!(result, NodeResult::AiText("HELLO SUMMARY".into()));

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Summarise: hello");
        assert_eq!(calls[0].1, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn label_is_the_prompt_fallback() {
        let llm = Arc::new(MockLlm::returning("ok completion text"));
        let executor = AiExecutor::new(llm.clone());
        let config = json!({ "label": "Describe the weather" });

        executor.execute(&ctx(&config, &[])).await;
        assert_eq!(llm.prompts(), vec!["Describe the weather"]);
    }

    #[tokio::test]
    async fn document_content_is_appended_to_the_prompt() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"pdf","content":"resume body text","metadata":{{"file_name":"r.pdf","character_count":16,"word_count":3}}}}"#
        )
        .unwrap();

        let llm = Arc::new(MockLlm::returning("skills: rust"));
        let executor = AiExecutor::new(llm.clone());
        let config = json!({ "prompt": "Extract skills" });
        let predecessors = vec![(
            "doc-1".to_owned(),
            NodeResult::DocumentParsed { path: file.path().to_string_lossy().into_owned() },
        )];

        executor.execute(&ctx(&config, &predecessors)).await;
        let prompt = llm.prompts().remove(0);
        assert!(prompt.starts_with("Extract skills"));
        assert!(prompt.ends_with("resume body text"));
        assert!(prompt.contains("Document content to analyze:"));
    }

    #[tokio::test]
    async fn missing_prompt_is_an_error_without_calling_the_model() {
        let llm = Arc::new(MockLlm::returning("unused"));
        let executor = AiExecutor::new(llm.clone());
        let config = json!({});

        let result = executor.execute(&ctx(&config, &[])).await;
        assert!(result.is_error());
        assert_eq!(llm.calls.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn client_failures_become_error_results() {
        let llm = Arc::new(MockLlm::failing("Rate limit exceeded"));
        let executor = AiExecutor::new(llm);
        let config = json!({ "prompt": "hi there friend" });

        let result = executor.execute(&ctx(&config, &[])).await;
        assert!(result.to_wire().starts_with("Error:"));
        assert!(result.to_wire().contains("Rate limit exceeded"));
    }
}
