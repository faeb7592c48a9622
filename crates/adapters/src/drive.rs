//! Google Drive adapter: upload and download.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::paths;
use crate::AdapterError;

const DRIVE_TIMEOUT_SECS: u64 = 60;
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";

/// Drive file operations the executors need.
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Upload the file and return a shareable URL.
    async fn upload(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        token: &str,
    ) -> Result<String, AdapterError>;

    /// Download a drive URL into `downloads/YYYYMMDD/` and return the local path.
    async fn download(&self, url: &str, token: &str) -> Result<PathBuf, AdapterError>;
}

/// Extract the file id from a `.../d/<id>/...` drive URL.
pub fn drive_file_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/d/")?;
    let id = rest.split('/').next()?;
    (!id.is_empty()).then_some(id)
}

/// Production REST implementation.
pub struct GoogleDriveClient {
    http: reqwest::Client,
}

impl GoogleDriveClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(DRIVE_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for GoogleDriveClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveClient for GoogleDriveClient {
    async fn upload(
        &self,
        path: &Path,
        name: &str,
        mime_type: &str,
        token: &str,
    ) -> Result<String, AdapterError> {
        if token.is_empty() {
            return Err(AdapterError::MissingCredential("GOOGLE_API_KEY".into()));
        }

        let bytes = tokio::fs::read(path).await?;
        let metadata = json!({ "name": name });

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(AdapterError::Http)?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .mime_str(mime_type)
                    .map_err(AdapterError::Http)?,
            );

        let response = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: body["error"]["message"].as_str().unwrap_or("upload rejected").into(),
            });
        }

        let file_id = body["id"]
            .as_str()
            .ok_or_else(|| AdapterError::Parse("no file id in upload response".into()))?;
        Ok(format!("https://drive.google.com/file/d/{file_id}/view"))
    }

    async fn download(&self, url: &str, token: &str) -> Result<PathBuf, AdapterError> {
        let download_url = match drive_file_id(url) {
            Some(id) => format!("https://www.googleapis.com/drive/v3/files/{id}?alt=media"),
            None => url.to_owned(),
        };

        let mut request = self.http.get(&download_url);
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: "download rejected".into(),
            });
        }

        // Keep the original extension when the URL carries one.
        let ext = url
            .rsplit('.')
            .next()
            .filter(|e| e.len() <= 4 && !e.contains('/'))
            .unwrap_or("bin");
        let dir = paths::download_dir_for_today()?;
        let target = dir.join(paths::unique_file_name("download", ext));

        let bytes = response.bytes().await?;
        tokio::fs::write(&target, &bytes).await?;
        Ok(target)
    }
}
