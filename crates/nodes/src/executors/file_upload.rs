//! File upload executor.
//!
//! A file produced by a predecessor (generated image, report, or parsed
//! JSON) takes precedence over the configured `path`.

use std::path::PathBuf;
use std::sync::Arc;

use adapters::DriveClient;
use async_trait::async_trait;
use credentials::ServiceKey;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

pub struct FileUploadExecutor {
    drive: Arc<dyn DriveClient>,
}

impl FileUploadExecutor {
    pub fn new(drive: Arc<dyn DriveClient>) -> Self {
        Self { drive }
    }
}

#[async_trait]
impl NodeExecutor for FileUploadExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let path = adapter::first_file_path(ctx.predecessors)
            .or_else(|| {
                ctx.config_str("path")
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
            });

        let Some(path) = path else {
            return NodeResult::error("File not found at path: ");
        };
        if !path.exists() {
            return NodeResult::error(format!("File not found at path: {}", path.display()));
        }

        let name = ctx
            .config_str("name")
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "file".to_owned());

        let mime_type = ctx
            .config_str("mime_type")
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                mime_guess::from_path(&path).first_or_octet_stream().essence_str().to_owned()
            });

        let token = ctx.credential(ServiceKey::Google).await;
        match self.drive.upload(&path, &name, &mime_type, &token).await {
            Ok(url) => NodeResult::FileUploaded { url },
            Err(e) => NodeResult::error(format!("File upload failed: {e}")),
        }
    }
}
