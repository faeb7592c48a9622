//! Email node executor.
//!
//! Before sending, predecessor results are folded into the message:
//! parsed documents are summarised into the body (5,000-char cap) and
//! attached as JSON, reports and images are attached, uploaded-file URLs
//! are appended as links, and AI free text lands under an
//! "AI Generated Content" section.

use std::sync::Arc;

use adapters::{Attachment, EmailMessage, Mailer};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

const DOCUMENT_BODY_LIMIT: usize = 5_000;

pub struct EmailExecutor {
    mailer: Arc<dyn Mailer>,
}

impl EmailExecutor {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    fn build_message(ctx: &NodeContext<'_>) -> EmailMessage {
        let mut body = ctx.config_str("body").unwrap_or_default().to_owned();

        // AI-generated content section.
        let ai_content = adapter::collect_ai_content(ctx.predecessors);
        if !ai_content.is_empty() {
            body.push_str("\n\n--- AI Generated Content ---\n");
            for item in &ai_content {
                body.push_str(&format!("\n**{} Response:**\n{}\n", item.model, item.content));
                body.push_str(&format!("\n{}\n", "-".repeat(50)));
            }
            body.push_str(
                "\n\nThis email contains AI-generated content from your AutoFlow workflow.\n",
            );
            body.push_str(&format!(
                "Generated on: {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }

        // Parsed-document summaries.
        for (_, document) in adapter::documents(ctx.predecessors) {
            body.push_str("\n\n--- Parsed Document Content ---\n");
            body.push_str(&format!("Document: {}\n", document.metadata.file_name));
            body.push_str(&format!("Type: {}\n", document.doc_type.to_uppercase()));

            let content = document.content.trim();
            if content.is_empty() {
                body.push_str("**Note:** No text content could be extracted from this document.");
            } else if content.chars().count() > DOCUMENT_BODY_LIMIT {
                let truncated: String = content.chars().take(DOCUMENT_BODY_LIMIT).collect();
                body.push_str(&format!(
                    "**Document Content:**\n{truncated}\n\n... (content truncated for email)"
                ));
            } else {
                body.push_str(&format!("**Document Content:**\n{content}"));
            }
        }

        // Uploaded-file links.
        for url in adapter::uploaded_urls(ctx.predecessors) {
            body.push_str(&format!("\n\nUploaded file: {url}"));
        }

        // Configured attachments plus predecessor-produced files.
        let mut attachments: Vec<Attachment> = configured_attachments(ctx.config);
        attachments.extend(
            adapter::collect_attachments(ctx.predecessors)
                .into_iter()
                .map(|a| Attachment { path: a.path, name: a.name }),
        );

        EmailMessage {
            to: ctx.config_str("to").unwrap_or_default().to_owned(),
            cc: string_list(ctx.config, "cc"),
            bcc: string_list(ctx.config, "bcc"),
            subject: ctx.config_str("subject").unwrap_or_default().to_owned(),
            body,
            attachments,
        }
    }
}

fn string_list(config: &Value, key: &str) -> Vec<String> {
    match config.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            s.split(',').map(|p| p.trim().to_owned()).collect()
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

fn configured_attachments(config: &Value) -> Vec<Attachment> {
    match config.get("attachments") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|p| {
                let path = std::path::PathBuf::from(p);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.to_owned());
                Attachment { path, name }
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl NodeExecutor for EmailExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let message = Self::build_message(ctx);
        if message.to.is_empty() {
            return NodeResult::error("Recipient email address is required");
        }

        match self.mailer.send(&message).await {
            Ok(()) => NodeResult::Notification(format!(
                "Email sent successfully to {}",
                message.to
            )),
            Err(e) => NodeResult::error(e),
        }
    }
}
