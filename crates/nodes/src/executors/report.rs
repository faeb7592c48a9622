//! Report generator executor.
//!
//! Every predecessor result contributes a section; the enriched markdown is
//! handed to the renderer for PDF or DOCX output.

use std::path::Path;
use std::sync::Arc;

use adapters::{ReportFormat, ReportRenderer};
use async_trait::async_trait;

use crate::adapter;
use crate::{NodeContext, NodeExecutor, NodeResult};

const DEFAULT_TITLE: &str = "AutoFlow Report";
const DOCUMENT_SECTION_LIMIT: usize = 1_000;

pub struct ReportGeneratorExecutor {
    renderer: Arc<dyn ReportRenderer>,
}

impl ReportGeneratorExecutor {
    pub fn new(renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { renderer }
    }

    fn build_content(ctx: &NodeContext<'_>) -> String {
        let configured = ctx.config_str("content").unwrap_or_default();
        let mut content = if configured.is_empty() {
            "# AutoFlow Workflow Report\n\n".to_owned()
        } else {
            format!("{configured}\n\n")
        };

        for (source_id, result) in ctx.predecessors {
            match result {
                NodeResult::FileUploaded { url } => {
                    content.push_str(&format!(
                        "## Uploaded File\n\n**File URL:** [View File]({url})\n\n"
                    ));
                }
                NodeResult::DocumentParsed { path } => {
                    if let Some(document) = adapter::load_document(path) {
                        content.push_str(&format!(
                            "## Document Analysis\n\n**Document:** {}\n\n**Type:** {}\n\n{}\n\n",
                            document.metadata.file_name,
                            document.doc_type.to_uppercase(),
                            adapter::truncate_chars(&document.content, DOCUMENT_SECTION_LIMIT),
                        ));
                    } else {
                        content.push_str(&format!(
                            "## Document Analysis\n\nError reading parsed document: {path}\n\n"
                        ));
                    }
                }
                NodeResult::ImageGenerated { path } => {
                    let name = Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    content.push_str(&format!("## Generated Image\n\nImage created: {name}\n\n"));
                }
                other => {
                    if let Some(text) = other.ai_text() {
                        content.push_str(&format!(
                            "## {} Analysis\n\n{text}\n\n",
                            adapter::model_for_source(source_id)
                        ));
                    } else {
                        let wire = other.to_wire();
                        if wire.contains("Email sent successfully") {
                            content.push_str(&format!("## Email Notification\n\n{wire}\n\n"));
                        } else if wire.contains("Webhook") && wire.contains("executed successfully")
                        {
                            content.push_str(&format!("## Webhook Execution\n\n{wire}\n\n"));
                        } else {
                            content
                                .push_str(&format!("## Node {source_id} Result\n\n{wire}\n\n"));
                        }
                    }
                }
            }
        }

        content
    }
}

#[async_trait]
impl NodeExecutor for ReportGeneratorExecutor {
    async fn execute(&self, ctx: &NodeContext<'_>) -> NodeResult {
        let title = ctx.config_str_or("title", DEFAULT_TITLE);
        let format = ReportFormat::parse(ctx.config_str_or("format", "pdf"));
        let content = Self::build_content(ctx);

        match self.renderer.render(title, &content, format).await {
            Ok(path) => NodeResult::ReportGenerated { path: path.to_string_lossy().into_owned() },
            Err(e) => NodeResult::error(format!("Report generation failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::mock::MockReportRenderer;
    use serde_json::json;
    use std::io::Write as _;

    fn ctx<'a>(
        config: &'a serde_json::Value,
        predecessors: &'a [(String, NodeResult)],
    ) -> NodeContext<'a> {
        NodeContext { node_id: "rep-1", config, predecessors, broker: None }
    }

    #[tokio::test]
    async fn every_predecessor_kind_contributes_a_section() {
        let mut doc = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            doc,
            r#"{{"type":"pdf","content":"document body","metadata":{{"file_name":"cv.pdf","character_count":13,"word_count":2}}}}"#
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(MockReportRenderer::into_dir(dir.path()));
        let executor = ReportGeneratorExecutor::new(renderer.clone());
        let config = json!({ "title": "Rpt", "format": "pdf" });
        let predecessors = vec![
            (
                "doc".to_owned(),
                NodeResult::DocumentParsed { path: doc.path().to_string_lossy().into_owned() },
            ),
            ("gpt-g".to_owned(), NodeResult::AiText("Skills: rust, sql, tokio.".into())),
            ("img".to_owned(), NodeResult::ImageGenerated { path: "generated_images/p.png".into() }),
            (
                "mail".to_owned(),
                NodeResult::Notification("Email sent successfully to u@x.test".into()),
            ),
            ("up".to_owned(), NodeResult::FileUploaded { url: "https://d/f/d/1/view".into() }),
            ("boom".to_owned(), NodeResult::Error("Error: nope".into())),
        ];

        let result = executor.execute(&ctx(&config, &predecessors)).await;
        assert!(matches!(result, NodeResult::ReportGenerated { .. }));

        let rendered = renderer.rendered.lock().unwrap();
        let (title, content, _) = &rendered[0];
        assert_eq!(title, "Rpt");
        assert!(content.contains("## Document Analysis"));
        assert!(content.contains("document body"));
        assert!(content.contains("## GPT Analysis"));
        assert!(content.contains("Skills: rust, sql, tokio."));
        assert!(content.contains("## Generated Image"));
        assert!(content.contains("Image created: p.png"));
        assert!(content.contains("## Email Notification"));
        assert!(content.contains("## Uploaded File"));
        assert!(content.contains("## Node boom Result"));
    }

    #[tokio::test]
    async fn report_file_lands_on_disk_with_the_content() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(MockReportRenderer::into_dir(dir.path()));
        let executor = ReportGeneratorExecutor::new(renderer);
        let config = json!({});
        let predecessors =
            vec![("gpt".to_owned(), NodeResult::AiText("Findings summary text.".into()))];

        let result = executor.execute(&ctx(&config, &predecessors)).await;
        let NodeResult::ReportGenerated { path } = result else { panic!() };
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("AutoFlow Report"));
        assert!(written.contains("Findings summary text."));
    }
}
