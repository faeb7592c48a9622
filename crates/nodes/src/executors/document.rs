//! Document parser executor.
//!
//! A `File uploaded:` predecessor pointing at a remote URL is downloaded
//! into `downloads/YYYYMMDD/` first; parsing itself is synchronous and runs
//! on the blocking pool.

use std::path::PathBuf;
use std::sync::Arc;

use adapters::documents;
use adapters::DriveClient;
use async_trait::async_trait;
use credentials::ServiceKey;

use crate::{NodeContext, NodeExecutor, NodeResult};

pub struct DocumentParserExecutor {
    drive: Arc<dyn DriveClient>,
}

impl DocumentParserExecutor {
    pub fn new(drive: Arc<dyn DriveClient>) -> Self {
        Self { drive }
    }

    /// Configured path, unless a predecessor uploaded a file.
    fn source(ctx: &NodeContext<'_>) -> Option<String> {
        for (_, result) in ctx.predecessors {
            if let NodeResult::FileUploaded { url } = result {
                return Some(url.clone());
            }
        }
        ctx.config_str("file_path")
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
    }
}

#[async_trait]
impl NodeExecutor for DocumentParserExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let Some(source) = Self::source(ctx) else {
            return NodeResult::error("No file path provided");
        };

        let local_path = if source.starts_with("http://") || source.starts_with("https://") {
            let token = ctx.credential(ServiceKey::Google).await;
            match self.drive.download(&source, &token).await {
                Ok(path) => path,
                Err(e) => return NodeResult::error(format!("Failed to download file: {e}")),
            }
        } else {
            PathBuf::from(&source)
        };

        if !local_path.exists() {
            return NodeResult::error(format!("File not found at path: {}", local_path.display()));
        }

        let parse_result = tokio::task::spawn_blocking(move || {
            documents::parse_document(&local_path)
                .and_then(|document| documents::write_parsed_json(&document))
        })
        .await;

        match parse_result {
            Ok(Ok(json_path)) => NodeResult::DocumentParsed {
                path: json_path.to_string_lossy().into_owned(),
            },
            Ok(Err(e)) => NodeResult::error(format!("Document parsing failed: {e}")),
            Err(e) => NodeResult::error(format!("Document parsing failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::mock::MockDrive;
    use serde_json::json;
    use std::io::Write as _;

    fn ctx<'a>(
        config: &'a serde_json::Value,
        predecessors: &'a [(String, NodeResult)],
    ) -> NodeContext<'a> {
        NodeContext { node_id: "doc-1", config, predecessors, broker: None }
    }

    #[tokio::test]
    async fn local_text_file_is_parsed_to_json() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "skills: rust, sql").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let drive = Arc::new(MockDrive::new("unused"));
        let executor = DocumentParserExecutor::new(drive);
        let config = json!({ "file_path": path });

        let result = executor.execute(&ctx(&config, &[])).await;
        let NodeResult::DocumentParsed { path: json_path } = &result else {
            panic!("expected DocumentParsed, got {result:?}");
        };

        let raw = std::fs::read_to_string(json_path).unwrap();
        assert!(raw.contains("skills: rust, sql"));
        std::fs::remove_file(json_path).ok();
    }

    #[tokio::test]
    async fn uploaded_url_predecessor_is_downloaded_first() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "downloaded body").unwrap();

        let drive =
            Arc::new(MockDrive::new("unused").with_download(file.path().to_path_buf()));
        let executor = DocumentParserExecutor::new(drive.clone());
        let config = json!({ "file_path": "" });
        let predecessors = vec![(
            "up".to_owned(),
            NodeResult::FileUploaded { url: "https://drive.google.com/file/d/f9/view".into() },
        )];

        let result = executor.execute(&ctx(&config, &predecessors)).await;
        assert!(matches!(result, NodeResult::DocumentParsed { .. }));
        assert_eq!(
            drive.downloads.lock().unwrap().as_slice(),
            ["https://drive.google.com/file/d/f9/view"]
        );
    }

    #[tokio::test]
    async fn missing_path_and_missing_file_are_errors() {
        let drive = Arc::new(MockDrive::new("unused"));
        let executor = DocumentParserExecutor::new(drive);

        let empty = json!({});
        assert_eq!(
            executor.execute(&ctx(&empty, &[])).await.to_wire(),
            "Error: No file path provided"
        );

        let gone = json!({ "file_path": "/nope/gone.txt" });
        let result = executor.execute(&ctx(&gone, &[])).await;
        assert!(result.to_wire().contains("File not found at path"));
    }
}
