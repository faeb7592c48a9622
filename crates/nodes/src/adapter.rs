//! The input adapter: shared absorption rules for predecessor results.
//!
//! Executors call into this module instead of re-implementing detection.
//! Iteration order always follows the predecessor slice, which the engine
//! keeps stable for a given topological sort.

use std::path::{Path, PathBuf};

use adapters::documents::ParsedDocument;
use tracing::warn;

use crate::NodeResult;

/// A predecessor-produced file suitable for attaching.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub path: PathBuf,
    pub name: String,
}

/// AI-generated content found among predecessors.
#[derive(Debug, Clone)]
pub struct AiContent {
    /// Display name inferred from the producing node's id.
    pub model: &'static str,
    pub content: String,
    pub source_id: String,
}

/// Infer a display model name from a predecessor node id.
pub fn model_for_source(source_id: &str) -> &'static str {
    let lowered = source_id.to_lowercase();
    if lowered.contains("gpt") {
        "GPT"
    } else if lowered.contains("claude") {
        "Claude"
    } else if lowered.contains("gemini") {
        "Gemini"
    } else if lowered.contains("llama") {
        "Llama"
    } else if lowered.contains("mistral") {
        "Mistral"
    } else {
        "AI Assistant"
    }
}

/// Collect AI free-text results in predecessor order.
pub fn collect_ai_content(predecessors: &[(String, NodeResult)]) -> Vec<AiContent> {
    predecessors
        .iter()
        .filter_map(|(id, result)| {
            result.ai_text().map(|text| AiContent {
                model: model_for_source(id),
                content: text.to_owned(),
                source_id: id.clone(),
            })
        })
        .collect()
}

/// Collect attachable files (parsed JSON, reports, images) that exist on disk.
pub fn collect_attachments(predecessors: &[(String, NodeResult)]) -> Vec<FileAttachment> {
    let mut attachments = Vec::new();
    for (_, result) in predecessors {
        let (path, fallback_name) = match result {
            NodeResult::DocumentParsed { path } => (path, Some("parsed_document.json")),
            NodeResult::ReportGenerated { path } | NodeResult::ImageGenerated { path } => {
                (path, None)
            }
            _ => continue,
        };
        let path = PathBuf::from(path);
        if !path.exists() {
            warn!(path = %path.display(), "predecessor file missing, skipping attachment");
            continue;
        }
        let name = fallback_name
            .map(str::to_owned)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "attachment".to_owned());
        attachments.push(FileAttachment { path, name });
    }
    attachments
}

/// Uploaded-file URLs in predecessor order.
pub fn uploaded_urls(predecessors: &[(String, NodeResult)]) -> Vec<String> {
    predecessors
        .iter()
        .filter_map(|(_, result)| match result {
            NodeResult::FileUploaded { url } => Some(url.clone()),
            _ => None,
        })
        .collect()
}

/// Load the parsed-document JSON a `Document parsed:` result points at.
pub fn load_document(path: &str) -> Option<ParsedDocument> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path, "cannot read parsed document: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(path, "cannot decode parsed document: {e}");
            None
        }
    }
}

/// All parsed documents among the predecessors, in order.
pub fn documents(predecessors: &[(String, NodeResult)]) -> Vec<(String, ParsedDocument)> {
    predecessors
        .iter()
        .filter_map(|(id, result)| match result {
            NodeResult::DocumentParsed { path } => {
                load_document(path).map(|doc| (id.clone(), doc))
            }
            _ => None,
        })
        .collect()
}

/// First predecessor-produced file that exists on disk (image, report, or
/// parsed JSON) — the precedence used by file-consuming executors.
pub fn first_file_path(predecessors: &[(String, NodeResult)]) -> Option<PathBuf> {
    for (_, result) in predecessors {
        let path = match result {
            NodeResult::ImageGenerated { path }
            | NodeResult::ReportGenerated { path }
            | NodeResult::DocumentParsed { path } => Path::new(path),
            _ => continue,
        };
        if path.exists() {
            return Some(path.to_owned());
        }
    }
    None
}

/// Truncate to `limit` characters, appending `…` when anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push('…');
    truncated
}
