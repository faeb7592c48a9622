//! The tagged result protocol.
//!
//! On the wire (the engine's result map, the HTTP response, history rows)
//! every node result is a single string with a recognised prefix. Internally
//! executors exchange this enum so nothing downstream re-sniffs substrings.
//! Tag matching is case-sensitive; the free-text skip list is lower-cased —
//! that asymmetry is part of the protocol.

use serde::{Deserialize, Serialize};

pub const TAG_DOCUMENT: &str = "Document parsed: ";
pub const TAG_REPORT: &str = "Report generated: ";
pub const TAG_IMAGE: &str = "Image generated: ";
pub const TAG_UPLOAD: &str = "File uploaded: ";

/// Substrings (matched against the lower-cased result) that disqualify a
/// string from being treated as AI-generated free text.
const AI_SKIP_TERMS: [&str; 10] = [
    "failed",
    "error",
    "not implemented",
    "sent successfully",
    "uploaded",
    "generated:",
    "deleted",
    "saved",
    "webhook",
    "document parsed:",
];

/// A node's execution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeResult {
    /// JSON representation of a parsed document exists at `path`.
    DocumentParsed { path: String },
    /// A rendered PDF/DOCX report exists at `path`.
    ReportGenerated { path: String },
    /// A generated PNG exists at `path`.
    ImageGenerated { path: String },
    /// A file was uploaded to the drive (URL or local path).
    FileUploaded { url: String },
    /// Free-form model output.
    AiText(String),
    /// A benign status sentinel (`Email sent successfully to …`,
    /// `Schedule set: …`, `Webhook triggered (no URL provided)`, …).
    Notification(String),
    /// A failure, carrying the full `Error: …` / `Failed: …` string.
    Error(String),
}

impl NodeResult {
    /// Build an error result with the canonical `Error: ` prefix.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self::Error(format!("Error: {reason}"))
    }

    /// Serialise to the wire string.
    pub fn to_wire(&self) -> String {
        match self {
            Self::DocumentParsed { path } => format!("{TAG_DOCUMENT}{path}"),
            Self::ReportGenerated { path } => format!("{TAG_REPORT}{path}"),
            Self::ImageGenerated { path } => format!("{TAG_IMAGE}{path}"),
            Self::FileUploaded { url } => format!("{TAG_UPLOAD}{url}"),
            Self::AiText(text) | Self::Notification(text) | Self::Error(text) => text.clone(),
        }
    }

    /// Recover the variant from a wire string.
    pub fn parse(wire: &str) -> Self {
        if let Some(path) = wire.strip_prefix(TAG_DOCUMENT) {
            return Self::DocumentParsed { path: path.trim().to_owned() };
        }
        if let Some(path) = wire.strip_prefix(TAG_REPORT) {
            return Self::ReportGenerated { path: path.trim().to_owned() };
        }
        if let Some(path) = wire.strip_prefix(TAG_IMAGE) {
            return Self::ImageGenerated { path: path.trim().to_owned() };
        }
        if let Some(url) = wire.strip_prefix(TAG_UPLOAD) {
            return Self::FileUploaded { url: url.trim().to_owned() };
        }
        if wire.starts_with("Error:") || wire.starts_with("Failed:") {
            return Self::Error(wire.to_owned());
        }
        if is_free_text(wire) {
            Self::AiText(wire.to_owned())
        } else {
            Self::Notification(wire.to_owned())
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The AI-generated free text carried by this result, if any.
    ///
    /// Applies the skip-term rules to the content itself, so a completion
    /// that *looks* like an error string is never absorbed downstream.
    pub fn ai_text(&self) -> Option<&str> {
        match self {
            Self::AiText(text) if is_free_text(text) => Some(text),
            _ => None,
        }
    }
}

/// True when `text` qualifies as AI-generated free text: more than ten
/// non-whitespace characters and none of the excluded status terms.
pub fn is_free_text(text: &str) -> bool {
    if text.trim().chars().filter(|c| !c.is_whitespace()).count() <= 10 {
        return false;
    }
    let lowered = text.to_lowercase();
    !AI_SKIP_TERMS.iter().any(|term| lowered.contains(term))
}
