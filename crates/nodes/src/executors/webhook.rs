//! Outbound webhook executor.
//!
//! An empty `webhook_url` is a success sentinel, not a failure — local-only
//! flows use webhook nodes purely as trigger points.

use std::collections::HashMap;
use std::sync::Arc;

use adapters::{AdapterError, HttpDispatcher, OutboundRequest};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::{NodeContext, NodeExecutor, NodeResult};

pub const NO_URL_SENTINEL: &str = "Webhook triggered (no URL provided)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const VALID_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
const RESPONSE_SNIPPET: usize = 200;

pub struct WebhookExecutor {
    dispatcher: Arc<dyn HttpDispatcher>,
}

impl WebhookExecutor {
    pub fn new(dispatcher: Arc<dyn HttpDispatcher>) -> Self {
        Self { dispatcher }
    }

    fn build_payload(ctx: &NodeContext<'_>) -> Value {
        // An explicit body wins; a JSON body is forwarded as-is, anything
        // else is wrapped so the receiver always gets an object.
        if let Some(body) = ctx.config_str("body").filter(|b| !b.is_empty()) {
            return serde_json::from_str(body).unwrap_or_else(|_| json!({ "data": body }));
        }
        // Trigger-injected payload (webhook-triggered runs).
        ctx.config.get("webhook_payload").cloned().unwrap_or_else(|| json!({}))
    }

    fn build_headers(ctx: &NodeContext<'_>) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".into(), "application/json".into());
        headers.insert("User-Agent".into(), "AutoFlow-Webhook/1.0".into());
        headers.insert("X-AutoFlow-Timestamp".into(), Utc::now().to_rfc3339());

        if let Some(custom) = ctx.config.get("headers").and_then(Value::as_object) {
            for (name, value) in custom {
                if let Some(value) = value.as_str() {
                    headers.insert(name.clone(), value.to_owned());
                }
            }
        }

        if let Some(token) = ctx.config_str("auth_token").filter(|t| !t.is_empty()) {
            let value = if token.starts_with("Bearer ") {
                token.to_owned()
            } else {
                format!("Bearer {token}")
            };
            headers.insert("Authorization".into(), value);
        }

        headers
    }
}

#[async_trait]
impl NodeExecutor for WebhookExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let url = ctx.config_str("webhook_url").unwrap_or_default();
        if url.is_empty() {
            return NodeResult::Notification(NO_URL_SENTINEL.to_owned());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return NodeResult::error(format!("Invalid webhook URL format: {url}"));
        }

        let method = ctx.config_str_or("method", "POST").to_uppercase();
        if !VALID_METHODS.contains(&method.as_str()) {
            return NodeResult::error(format!(
                "Unsupported HTTP method '{method}'. Supported: {}",
                VALID_METHODS.join(", ")
            ));
        }

        let timeout_secs = ctx
            .config
            .get("timeout")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let request = OutboundRequest {
            method,
            url: url.to_owned(),
            headers: Self::build_headers(ctx),
            payload: Self::build_payload(ctx),
            timeout_secs,
        };

        match self.dispatcher.dispatch(&request).await {
            Ok(response) => {
                let snippet: String = response.body.chars().take(RESPONSE_SNIPPET).collect();
                match response.status {
                    200..=299 => NodeResult::Notification(format!(
                        "Webhook executed successfully! Status: {}, Response: {snippet}",
                        response.status
                    )),
                    400..=499 => NodeResult::error(format!(
                        "Webhook client error ({}): {snippet}",
                        response.status
                    )),
                    _ => NodeResult::error(format!("Webhook server error ({})", response.status)),
                }
            }
            Err(AdapterError::Timeout { seconds }) => NodeResult::error(format!(
                "Webhook request timed out after {seconds} seconds"
            )),
            Err(e) => NodeResult::error(format!("Webhook request failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::mock::MockDispatcher;
    use serde_json::json;

    fn ctx<'a>(config: &'a serde_json::Value) -> NodeContext<'a> {
        NodeContext { node_id: "hook-1", config, predecessors: &[], broker: None }
    }

    #[tokio::test]
    async fn empty_url_is_the_benign_sentinel() {
        let dispatcher = Arc::new(MockDispatcher::returning(200, "ok"));
        let executor = WebhookExecutor::new(dispatcher.clone());
        let config = json!({ "webhook_url": "" });

        let result = executor.execute(&ctx(&config)).await;
        assert_eq!(result.to_wire(), NO_URL_SENTINEL);
        assert!(dispatcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_embeds_status_and_body_snippet() {
        let dispatcher = Arc::new(MockDispatcher::returning(201, "created the thing"));
        let executor = WebhookExecutor::new(dispatcher);
        let config = json!({ "webhook_url": "https://svc.test/hook" });

        let result = executor.execute(&ctx(&config)).await;
        let wire = result.to_wire();
        assert!(wire.contains("Status: 201"));
        assert!(wire.contains("created the thing"));
    }

    #[tokio::test]
    async fn status_classes_map_to_error_results() {
        for (status, needle) in [(404, "client error (404)"), (503, "server error (503)")] {
            let dispatcher = Arc::new(MockDispatcher::returning(status, "nope"));
            let executor = WebhookExecutor::new(dispatcher);
            let config = json!({ "webhook_url": "https://svc.test/hook" });
            let result = executor.execute(&ctx(&config)).await;
            assert!(result.is_error());
            assert!(result.to_wire().contains(needle), "{status}");
        }
    }

    #[tokio::test]
    async fn timeout_reports_the_configured_seconds() {
        let dispatcher = Arc::new(MockDispatcher::timing_out());
        let executor = WebhookExecutor::new(dispatcher);
        let config = json!({ "webhook_url": "https://slow.test/hook", "timeout": 5 });

        let result = executor.execute(&ctx(&config)).await;
        assert_eq!(
            result.to_wire(),
            "Error: Webhook request timed out after 5 seconds"
        );
    }

    #[tokio::test]
    async fn invalid_method_and_url_are_rejected_up_front() {
        let dispatcher = Arc::new(MockDispatcher::returning(200, ""));
        let executor = WebhookExecutor::new(dispatcher.clone());

        let bad_method = json!({ "webhook_url": "https://svc.test", "method": "BREW" });
        assert!(executor.execute(&ctx(&bad_method)).await.is_error());

        let bad_url = json!({ "webhook_url": "ftp://svc.test" });
        assert!(executor.execute(&ctx(&bad_url)).await.is_error());

        assert!(dispatcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_payload_and_headers_travel_on_the_request() {
        let dispatcher = Arc::new(MockDispatcher::returning(200, "ok"));
        let executor = WebhookExecutor::new(dispatcher.clone());
        let config = json!({
            "webhook_url": "https://svc.test/hook",
            "webhook_payload": { "x": 1, "y": "z" },
            "auth_token": "tok123",
        });

        executor.execute(&ctx(&config)).await;
        let requests = dispatcher.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.payload, json!({ "x": 1, "y": "z" }));
        assert_eq!(request.headers["User-Agent"], "AutoFlow-Webhook/1.0");
        assert_eq!(request.headers["Authorization"], "Bearer tok123");
        assert!(request.headers.contains_key("X-AutoFlow-Timestamp"));
        assert_eq!(request.timeout_secs, 30);
    }

    #[tokio::test]
    async fn plain_body_is_wrapped_as_data() {
        let dispatcher = Arc::new(MockDispatcher::returning(200, "ok"));
        let executor = WebhookExecutor::new(dispatcher.clone());
        let config = json!({ "webhook_url": "https://svc.test/hook", "body": "not json" });

        executor.execute(&ctx(&config)).await;
        let requests = dispatcher.requests.lock().unwrap();
        assert_eq!(requests[0].payload, json!({ "data": "not json" }));
    }
}
