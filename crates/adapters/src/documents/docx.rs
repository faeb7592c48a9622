//! DOCX text extraction.
//!
//! A .docx file is a zip package; the visible text lives in
//! `word/document.xml` as `<w:t>` runs grouped into `<w:p>` paragraphs.

use std::io::Read as _;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::AdapterError;

use super::ParsedDocument;

pub(super) fn parse(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AdapterError::Parse(format!("not a DOCX package: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| AdapterError::Parse(format!("missing document part: {e}")))?
        .read_to_string(&mut xml)?;

    let content = extract_text(&xml)?;
    Ok(ParsedDocument::new("docx", content, path))
}

fn extract_text(xml: &str) -> Result<String, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut content = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => content.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                content.push_str(
                    &t.unescape()
                        .map_err(|e| AdapterError::Parse(format!("bad XML text: {e}")))?,
                );
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::Parse(format!("malformed document XML: {e}"))),
            _ => {}
        }
    }

    Ok(content.trim_end().to_owned())
}
