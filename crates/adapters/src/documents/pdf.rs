//! PDF text extraction.

use std::path::Path;

use crate::AdapterError;

use super::ParsedDocument;

pub(super) fn parse(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let content = pdf_extract::extract_text(path)
        .map_err(|e| AdapterError::Parse(format!("PDF extraction failed: {e}")))?;

    // Extraction separates pages with form feeds.
    let pages = content.matches('\u{c}').count().max(1);

    let mut document = ParsedDocument::new("pdf", content, path);
    document.pages = Some(pages);
    Ok(document)
}
