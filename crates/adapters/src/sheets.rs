//! Google Sheets adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::AdapterError;

const SHEETS_TIMEOUT_SECS: u64 = 30;

/// Writing a 2-D range of values.
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Write `values` into `range` and return a human-readable status.
    async fn write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        token: &str,
    ) -> Result<String, AdapterError>;
}

/// Production REST implementation (`values.update`).
pub struct GoogleSheetsClient {
    http: reqwest::Client,
}

impl GoogleSheetsClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(SHEETS_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for GoogleSheetsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetsClient for GoogleSheetsClient {
    async fn write(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        token: &str,
    ) -> Result<String, AdapterError> {
        if token.is_empty() {
            return Err(AdapterError::MissingCredential("GOOGLE_API_KEY".into()));
        }

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{spreadsheet_id}/values/{range}?valueInputOption=USER_ENTERED"
        );
        let payload = json!({ "range": range, "values": values });

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: body["error"]["message"].as_str().unwrap_or("write rejected").into(),
            });
        }

        let updated = body["updatedCells"].as_u64().unwrap_or(0);
        Ok(format!("Updated {updated} cells in range {range}"))
    }
}
