//! Image asset records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage category of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    Documents,
    Gallery,
    Temp,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Gallery => "gallery",
            Self::Temp => "temp",
        }
    }

    /// Map a free-form category name. Anything unrecognised lands in `temp`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "documents" => Self::Documents,
            "gallery" => Self::Gallery,
            _ => Self::Temp,
        }
    }
}

/// Upload parameters for a new image.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub category: ImageCategory,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub description: String,
}

impl NewImage {
    pub const DEFAULT_SUBCATEGORY: &'static str = "misc";

    pub fn new(filename: impl Into<String>, category: ImageCategory) -> Self {
        Self {
            filename: filename.into(),
            category,
            subcategory: Self::DEFAULT_SUBCATEGORY.to_string(),
            tags: Vec::new(),
            description: String::new(),
        }
    }
}

/// Metadata for a stored image, persisted as `admin/images/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    /// Original filename as uploaded.
    pub filename: String,
    pub stored_filename: String,
    /// Path relative to the `static` directory.
    pub path: String,
    /// Public URL path.
    pub url: String,
    pub category: ImageCategory,
    pub subcategory: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub size: u64,
    pub mime_type: String,
    pub content_hash: String,
    pub upload_time: DateTime<Utc>,
    /// Ids of documents whose published content references this image.
    #[serde(default)]
    pub used_in_documents: Vec<String>,
}
