//! Process-global output directory layout.
//!
//! Filenames are UUID-suffixed so concurrent runs never collide; cleanup is
//! left to an external janitor.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

pub const UPLOADS_DIR: &str = "uploads";
pub const REPORTS_DIR: &str = "generated_reports";
pub const IMAGES_DIR: &str = "generated_images";
pub const PARSED_DIR: &str = "parsed_documents";
pub const DOWNLOADS_DIR: &str = "downloads";

/// Ensure `dir` exists and return it as a `PathBuf`.
pub fn ensure_dir(dir: &str) -> std::io::Result<PathBuf> {
    let path = PathBuf::from(dir);
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// Today's download directory: `downloads/YYYYMMDD/`.
pub fn download_dir_for_today() -> std::io::Result<PathBuf> {
    let path = Path::new(DOWNLOADS_DIR).join(Utc::now().format("%Y%m%d").to_string());
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

/// A collision-free file name: `<stem>_<8-hex-uuid>.<ext>`.
pub fn unique_file_name(stem: &str, ext: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{stem}_{}.{ext}", &suffix[..8])
}
