//! Shared helpers for the document repository.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::Document;
use crate::repository::{RepositoryError, Result};
use crate::services::content;

/// File extensions accepted by import.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

/// Generate a document id: `doc_{unix seconds}_{8 hex chars}`.
pub fn generate_doc_id() -> String {
    generate_id("doc")
}

pub(crate) fn generate_id(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, Utc::now().timestamp(), &suffix[..8])
}

/// Reject filenames whose extension is not in [`ALLOWED_EXTENSIONS`].
pub fn check_extension(filename: &str) -> Result<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(RepositoryError::validation(format!(
            "unsupported file type: .{}",
            ext
        ))),
        None => Err(RepositoryError::validation(format!(
            "file has no extension: {}",
            filename
        ))),
    }
}

/// Accept front matter dates as RFC 3339, `YYYY-MM-DD` or
/// `YYYY-MM-DDTHH:MM:SS`. The date is rendered unquoted, so anything else is
/// rejected.
pub fn check_date(date: &str) -> Result<()> {
    let valid = DateTime::parse_from_rfc3339(date).is_ok()
        || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S").is_ok();
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::validation(format!("invalid date: {:?}", date)))
    }
}

/// Title fallback when the content carries none.
pub fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("untitled")
        .to_string()
}

/// Replace the document's content and recompute derived fields.
pub fn set_content(doc: &mut Document, text: String) {
    doc.size = text.len() as u64;
    doc.word_count = content::count_words(&text);
    doc.content = text;
}
