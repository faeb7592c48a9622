//! Report rendering: markdown-ish content to a PDF or DOCX file on disk.
//!
//! The PDF writer emits uncompressed content streams (PDF 1.4, Helvetica)
//! so report text stays grep-able in the output file. DOCX output is the
//! minimal OOXML package: content types, package rels, and a document part
//! with one paragraph per line.

use std::io::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::paths;
use crate::AdapterError;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 11.0;
const LEADING: f32 = 14.0;
const MAX_LINE_CHARS: usize = 92;

/// Output format for a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Self::Docx,
            _ => Self::Pdf,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Rendering a titled text document to disk.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render and return the path of the written file.
    async fn render(
        &self,
        title: &str,
        content: &str,
        format: ReportFormat,
    ) -> Result<PathBuf, AdapterError>;
}

/// Writes report files into `generated_reports/`.
pub struct FileReportRenderer;

#[async_trait]
impl ReportRenderer for FileReportRenderer {
    async fn render(
        &self,
        title: &str,
        content: &str,
        format: ReportFormat,
    ) -> Result<PathBuf, AdapterError> {
        let dir = paths::ensure_dir(paths::REPORTS_DIR)?;
        let target = dir.join(paths::unique_file_name("report", format.extension()));

        let bytes = match format {
            ReportFormat::Pdf => render_pdf(title, content),
            ReportFormat::Docx => render_docx(title, content)?,
        };
        std::fs::write(&target, bytes)?;
        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn render_pdf(title: &str, content: &str) -> Vec<u8> {
    let mut lines = vec![title.to_owned(), String::new()];
    for raw in content.lines() {
        lines.extend(wrap_line(raw, MAX_LINE_CHARS));
    }

    let lines_per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize;
    let pages: Vec<&[String]> = lines.chunks(lines_per_page.max(1)).collect();
    let page_count = pages.len().max(1);

    // Object numbering: 1 catalog, 2 page tree, then (page, content) pairs,
    // finally the font object.
    let font_obj = 3 + 2 * page_count;
    let mut objects: Vec<String> = Vec::with_capacity(font_obj);

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_owned());

    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
        kids.join(" ")
    ));

    for i in 0..page_count {
        let content_obj = 4 + 2 * i;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 {font_obj} 0 R >> >> /Contents {content_obj} 0 R >>"
        ));

        let mut stream = String::new();
        stream.push_str(&format!(
            "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {} Td\n",
            PAGE_HEIGHT - MARGIN
        ));
        for line in pages.get(i).copied().unwrap_or(&[]) {
            stream.push_str(&format!("({}) Tj\nT*\n", escape_pdf_text(line)));
        }
        stream.push_str("ET\n");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_owned());

    // Assemble with a correct xref table.
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

fn escape_pdf_text(line: &str) -> String {
    line.chars()
        .flat_map(|c| match c {
            '\\' => vec!['\\', '\\'],
            '(' => vec!['\\', '('],
            ')' => vec!['\\', ')'],
            c if c.is_ascii() => vec![c],
            // Helvetica with the default encoding cannot carry non-ASCII;
            // replace rather than corrupt the stream.
            _ => vec!['?'],
        })
        .collect()
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_owned()];
    }
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > width {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

// ---------------------------------------------------------------------------
// DOCX
// ---------------------------------------------------------------------------

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn render_docx(title: &str, content: &str) -> Result<Vec<u8>, AdapterError> {
    let mut body = String::new();
    body.push_str(&paragraph(title, true));
    for line in content.lines() {
        body.push_str(&paragraph(line, false));
    }

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{body}</w:body>
</w:document>"#
    );

    package_docx(&document).map_err(|e| AdapterError::Parse(format!("docx packaging failed: {e}")))
}

fn package_docx(document: &str) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    let parts: [(&str, &str); 3] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", document),
    ];
    for (name, body) in parts {
        writer.start_file(name, options)?;
        writer.write_all(body.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

fn paragraph(text: &str, bold: bool) -> String {
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        "<w:p><w:r>{props}<w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pdf_report_contains_its_text() {
        let renderer = FileReportRenderer;
        let path = renderer
            .render("Quarterly Summary", "Revenue grew.\nCosts (net) fell.", ReportFormat::Pdf)
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("Quarterly Summary"));
        assert!(text.contains("Costs \\(net\\) fell."));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn docx_report_is_a_zip_package() {
        let renderer = FileReportRenderer;
        let path = renderer
            .render("T", "a & b", ReportFormat::Docx)
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // Zip local-file-header magic.
        assert_eq!(&bytes[..2], b"PK");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn long_lines_are_wrapped() {
        let line = "word ".repeat(40);
        let wrapped = wrap_line(line.trim(), 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 20));
    }
}
