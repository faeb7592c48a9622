//! Messaging executor (`sms`, `whatsapp`, `twilio`).
//!
//! Applies the same predecessor absorption as email — document summaries
//! and AI text are prepended to the configured message.

use std::sync::Arc;

use adapters::{MessageMode, MessageSender, TwilioCredentialSet};
use async_trait::async_trait;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

const DOCUMENT_MESSAGE_LIMIT: usize = 5_000;

pub struct MessagingExecutor {
    sender: Arc<dyn MessageSender>,
}

impl MessagingExecutor {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }

    fn build_body(ctx: &NodeContext<'_>) -> String {
        let mut segments: Vec<String> = Vec::new();

        for (_, document) in adapter::documents(ctx.predecessors) {
            if !document.content.trim().is_empty() {
                segments.push(format!(
                    "Document {}:\n{}",
                    document.metadata.file_name,
                    adapter::truncate_chars(document.content.trim(), DOCUMENT_MESSAGE_LIMIT)
                ));
            }
        }
        for item in adapter::collect_ai_content(ctx.predecessors) {
            segments.push(item.content);
        }

        let configured = ctx.config_str("message").unwrap_or_default();
        if !configured.is_empty() {
            segments.push(configured.to_owned());
        }

        segments.join("\n\n")
    }
}

#[async_trait]
impl NodeExecutor for MessagingExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let to = ctx.config_str("to").unwrap_or_default();
        if to.is_empty() {
            return NodeResult::error("Phone number is required");
        }
        if !to.starts_with('+') {
            return NodeResult::error(format!(
                "Phone number must include country code (e.g., +1234567890), got: {to}"
            ));
        }

        let body = Self::build_body(ctx);
        if body.trim().is_empty() {
            return NodeResult::error("Message content is required");
        }

        let mode = MessageMode::parse(ctx.config_str_or("mode", "whatsapp"));

        let twilio = match ctx.broker {
            Some(broker) => broker.twilio().await,
            None => Default::default(),
        };
        let credentials = TwilioCredentialSet {
            sid: non_empty_or_env(twilio.sid, "TWILIO_ACCOUNT_SID"),
            token: non_empty_or_env(twilio.token, "TWILIO_AUTH_TOKEN"),
            phone: non_empty_or_env(twilio.phone, "TWILIO_PHONE_NUMBER"),
        };
        if credentials.sid.is_empty() || credentials.token.is_empty() || credentials.phone.is_empty()
        {
            return NodeResult::error(
                "Twilio credentials not configured. Please set TWILIO_ACCOUNT_SID, \
                 TWILIO_AUTH_TOKEN, and TWILIO_PHONE_NUMBER",
            );
        }

        match self.sender.send(mode, to, &body, &credentials).await {
            Ok(_sid) => NodeResult::Notification(format!(
                "{} sent successfully to {}",
                mode.tag(),
                to.trim_start_matches("whatsapp:")
            )),
            Err(e) => NodeResult::error(e),
        }
    }
}

fn non_empty_or_env(value: String, var: &str) -> String {
    if value.is_empty() {
        std::env::var(var).unwrap_or_default()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::mock::MockMessageSender;
    use credentials::{CredentialBroker, Crypto, InMemoryCredentialStore};
    use serde_json::json;

    fn broker_with_twilio() -> CredentialBroker {
        use base64::Engine as _;
        let key = base64::engine::general_purpose::STANDARD.encode([5u8; 32]);
        let store = InMemoryCredentialStore::new(Crypto::from_key_b64(&key).unwrap());
        store.insert("u1", "twilio_sid", "AC123").unwrap();
        store.insert("u1", "twilio_token", "tok").unwrap();
        store.insert("u1", "twilio_phone", "+15550001111").unwrap();
        CredentialBroker::new(Arc::new(store), "u1")
    }

    #[tokio::test]
    async fn whatsapp_is_the_default_mode() {
        let sender = Arc::new(MockMessageSender::new());
        let executor = MessagingExecutor::new(sender.clone());
        let broker = broker_with_twilio();
        let config = json!({ "to": "+15551234567", "message": "ping" });
        let ctx = NodeContext {
            node_id: "wa-1",
            config: &config,
            predecessors: &[],
            broker: Some(&broker),
        };

        let result = executor.execute(&ctx).await;
        assert_eq!(result.to_wire(), "WHATSAPP sent successfully to +15551234567");

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].0, MessageMode::Whatsapp);
        assert_eq!(sent[0].2, "ping");
    }

    #[tokio::test]
    async fn ai_text_is_prepended_to_the_message() {
        let sender = Arc::new(MockMessageSender::new());
        let executor = MessagingExecutor::new(sender.clone());
        let broker = broker_with_twilio();
        let config = json!({ "to": "+15551234567", "message": "see above", "mode": "sms" });
        let predecessors = vec![(
            "gpt".to_owned(),
            NodeResult::AiText("Summary of the day's numbers.".into()),
        )];
        let ctx = NodeContext {
            node_id: "sms-1",
            config: &config,
            predecessors: &predecessors,
            broker: Some(&broker),
        };

        let result = executor.execute(&ctx).await;
        assert!(result.to_wire().starts_with("SMS sent successfully"));

        let sent = sender.sent.lock().unwrap();
        let body = &sent[0].2;
        assert!(body.starts_with("Summary of the day's numbers."));
        assert!(body.ends_with("see above"));
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_sender() {
        let sender = Arc::new(MockMessageSender::new());
        let executor = MessagingExecutor::new(sender.clone());

        for config in [
            json!({ "message": "m" }),                       // no number
            json!({ "to": "5551234567", "message": "m" }),   // no country code
            json!({ "to": "+15551234567" }),                 // no content
        ] {
            let ctx = NodeContext {
                node_id: "sms-1",
                config: &config,
                predecessors: &[],
                broker: None,
            };
            assert!(executor.execute(&ctx).await.is_error());
        }
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
