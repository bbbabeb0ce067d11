//! Flat-file persistence.
//!
//! The file system is the only source of truth. Every JSON record is written
//! with write-new-then-rename so a concurrent reader never sees a half-written
//! record, and the record is always written after its content file: a record
//! on disk means the write it belongs to completed.

pub mod document;
pub mod image;
pub mod layout;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use document::DocumentRepository;
pub use image::ImageRepository;
pub use layout::{Area, RecoveryReport, StorageLayout};

/// Prefix of temporary files created by [`write_atomic`].
pub(crate) const TEMP_PREFIX: &str = ".draftpress-";

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Bad input from the caller.
    #[error("{0}")]
    Validation(String),

    /// Unknown id, or the document is not in the required lifecycle area.
    #[error("{0}")]
    NotFound(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RepositoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Check that a caller-supplied id is safe to use as a file stem.
pub fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::validation(format!("invalid id: {:?}", id)))
    }
}

/// Write `contents` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| RepositoryError::validation(format!("no parent: {}", path.display())))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| RepositoryError::io(dir, e))?;
    tmp.write_all(contents)
        .map_err(|e| RepositoryError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| RepositoryError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RepositoryError::io(path, e.error))?;
    Ok(())
}

/// Serialize `value` as pretty-printed JSON and write it atomically.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| RepositoryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, json.as_bytes())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| RepositoryError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|source| RepositoryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| RepositoryError::io(path, e))
}

/// Remove a file, returning whether it existed.
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RepositoryError::io(path, e)),
    }
}

/// Ids of all `*.json` records in `dir`, sorted.
pub(crate) fn record_ids(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RepositoryError::io(dir, e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RepositoryError::io(dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if !stem.starts_with(TEMP_PREFIX) {
                ids.push(stem.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}
