//! Document parsers: PDF, DOCX, XLSX, CSV, JSON and TXT to a common JSON
//! representation.
//!
//! The executors only ever consume the [`ParsedDocument`] shape; its JSON
//! serialisation is what lands in `parsed_documents/` and travels through
//! the `Document parsed: <path>` protocol string.

mod docx;
mod pdf;
mod xlsx;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths;
use crate::AdapterError;

/// Common metadata carried by every parsed document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub character_count: usize,
    pub word_count: usize,
}

/// One worksheet of a parsed spreadsheet: header row plus data rows.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SheetData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The JSON representation written for every parsed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    /// PDF only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    /// Excel only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets: Option<BTreeMap<String, SheetData>>,
}

impl ParsedDocument {
    fn new(doc_type: &str, content: String, path: &Path) -> Self {
        let metadata = DocumentMetadata {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            character_count: content.chars().count(),
            word_count: content.split_whitespace().count(),
        };
        Self {
            doc_type: doc_type.to_owned(),
            content,
            metadata,
            pages: None,
            sheets: None,
        }
    }
}

/// Parse a file by extension.
pub fn parse_document(path: &Path) -> Result<ParsedDocument, AdapterError> {
    if !path.exists() {
        return Err(AdapterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found at path: {}", path.display()),
        )));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => pdf::parse(path),
        "docx" => docx::parse(path),
        "xlsx" => xlsx::parse(path),
        "csv" => parse_csv(path),
        "json" => parse_json(path),
        "txt" | "md" | "log" => parse_txt(path),
        other => Err(AdapterError::Unsupported(format!("document type: .{other}"))),
    }
}

/// Write the parsed representation into `parsed_documents/` and return its path.
pub fn write_parsed_json(document: &ParsedDocument) -> Result<PathBuf, AdapterError> {
    let dir = paths::ensure_dir(paths::PARSED_DIR)?;
    let target = dir.join(paths::unique_file_name("parsed", "json"));
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| AdapterError::Parse(e.to_string()))?;
    std::fs::write(&target, json)?;
    Ok(target)
}

fn parse_txt(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let content = std::fs::read_to_string(path)?;
    Ok(ParsedDocument::new("text", content, path))
}

fn parse_json(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| AdapterError::Parse(format!("invalid JSON: {e}")))?;
    let content = serde_json::to_string_pretty(&value).unwrap_or(raw);
    Ok(ParsedDocument::new("json", content, path))
}

fn parse_csv(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AdapterError::Parse(format!("invalid CSV: {e}")))?;

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AdapterError::Parse(format!("invalid CSV row: {e}")))?;
        lines.push(record.iter().collect::<Vec<_>>().join(", "));
    }

    Ok(ParsedDocument::new("csv", lines.join("\n"), path))
}
