//! Google Sheets executor.
//!
//! A parsed-Excel predecessor replaces the configured `values` with that
//! sheet's header row plus data rows; other parsed documents become a
//! two-column summary table.

use std::sync::Arc;

use adapters::documents::ParsedDocument;
use adapters::SheetsClient;
use async_trait::async_trait;
use credentials::ServiceKey;
use serde_json::Value;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

const SUMMARY_CONTENT_LIMIT: usize = 1_000;

pub struct SheetsExecutor {
    client: Arc<dyn SheetsClient>,
}

impl SheetsExecutor {
    pub fn new(client: Arc<dyn SheetsClient>) -> Self {
        Self { client }
    }

    fn values_from_document(document: &ParsedDocument) -> Vec<Vec<String>> {
        if document.doc_type == "excel" {
            if let Some(sheet) = document.sheets.as_ref().and_then(|s| s.values().next()) {
                let mut values = vec![sheet.columns.clone()];
                values.extend(sheet.rows.iter().cloned());
                return values;
            }
        }
        vec![
            vec!["Document Info".into(), "Value".into()],
            vec!["File Name".into(), document.metadata.file_name.clone()],
            vec!["Type".into(), document.doc_type.clone()],
            vec![
                "Content".into(),
                adapter::truncate_chars(&document.content, SUMMARY_CONTENT_LIMIT),
            ],
        ]
    }

    fn configured_values(config: &Value) -> Vec<Vec<String>> {
        let Some(rows) = config.get("values").and_then(Value::as_array) else {
            return Vec::new();
        };
        rows.iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(cell_to_string).collect(),
                other => vec![cell_to_string(other)],
            })
            .collect()
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl NodeExecutor for SheetsExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let spreadsheet_id = ctx.config_str("spreadsheet_id").unwrap_or_default();
        if spreadsheet_id.is_empty() {
            return NodeResult::error("Spreadsheet ID is required");
        }
        let range = ctx.config_str("range").unwrap_or_default();
        if range.is_empty() {
            return NodeResult::error("Sheet range is required");
        }

        // First parsed-document predecessor wins over configured values.
        let values = match adapter::documents(ctx.predecessors).into_iter().next() {
            Some((_, document)) => Self::values_from_document(&document),
            None => Self::configured_values(ctx.config),
        };
        if values.is_empty() {
            return NodeResult::error("No values to write");
        }

        let token = ctx.credential(ServiceKey::Google).await;
        match self.client.write(spreadsheet_id, range, &values, &token).await {
            Ok(status) => NodeResult::Notification(status),
            Err(e) => NodeResult::error(e),
        }
    }
}
