//! Document model and lifecycle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Processed,
    Published,
    Error,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        DocumentStatus::Pending,
        DocumentStatus::Processing,
        DocumentStatus::Processed,
        DocumentStatus::Published,
        DocumentStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Published => "published",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "published" => Ok(Self::Published),
            "error" => Ok(Self::Error),
            _ => Err(format!("invalid document status: {}", s)),
        }
    }
}

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Imported from a local file (CLI).
    Manual,
    /// Uploaded through the import endpoint.
    WebUpload,
    /// Created from scratch by the editor's save call.
    WebEditor,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::WebUpload => "web_upload",
            Self::WebEditor => "web_editor",
        }
    }
}

impl std::str::FromStr for DocumentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "web_upload" => Ok(Self::WebUpload),
            "web_editor" => Ok(Self::WebEditor),
            _ => Err(format!("invalid document source: {}", s)),
        }
    }
}

/// An image embedded in a document.
///
/// Inline payloads wait in the queue as `Pending` until publish extracts them
/// to disk, after which only the public URL is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageRef {
    Pending { id: String, data: String },
    Stored { id: String, url: String },
}

impl ImageRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Pending { id, .. } | Self::Stored { id, .. } => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Front matter fields rendered at the top of processed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub show_toc: bool,
    #[serde(default)]
    pub toc_open: bool,
}

fn default_true() -> bool {
    true
}

impl FrontMatter {
    /// Front matter with defaults, dated at `date`.
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            date: date.to_rfc3339(),
            draft: false,
            tags: Vec::new(),
            categories: Vec::new(),
            description: String::new(),
            show_toc: true,
            toc_open: false,
        }
    }
}

/// An inline image supplied with a metadata patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    #[serde(default)]
    pub id: Option<String>,
    /// A `data:image/<ext>;base64,...` URI.
    pub data: String,
}

/// Partial metadata update applied when processing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<InlineImage>,
}

/// A document record as persisted in `{area}/{id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub content: String,
    pub status: DocumentStatus,
    pub source: DocumentSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub size: u64,
    pub word_count: usize,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_matter: Option<FrontMatter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_file: Option<String>,
}

impl Document {
    /// Bump `updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Mark the document processed. `processed_at` is only set the first time.
    pub fn mark_processed(&mut self, now: DateTime<Utc>) {
        self.status = DocumentStatus::Processed;
        self.processed_at.get_or_insert(now);
        self.touch(now);
    }

    /// Mark the document published to `file`. `published_at` is only set the first time.
    pub fn mark_published(&mut self, file: String, now: DateTime<Utc>) {
        self.status = DocumentStatus::Published;
        self.published_at.get_or_insert(now);
        self.published_file = Some(file);
        self.touch(now);
    }

    /// Number of images still waiting for extraction.
    pub fn pending_image_count(&self) -> usize {
        self.images.iter().filter(|i| i.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> Document {
        Document {
            id: "doc_1_abcdef12".to_string(),
            filename: "a.md".to_string(),
            title: "A".to_string(),
            content: "body".to_string(),
            status: DocumentStatus::Pending,
            source: DocumentSource::Manual,
            created_at: now,
            updated_at: now,
            processed_at: None,
            published_at: None,
            size: 4,
            word_count: 1,
            images: Vec::new(),
            front_matter: None,
            published_file: None,
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(
            "Processed".parse::<DocumentStatus>(),
            Ok(DocumentStatus::Processed)
        );
        assert!("archived".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DocumentSource::WebEditor).unwrap();
        assert_eq!(json, "\"web_editor\"");
        for status in DocumentStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_timestamps_set_once() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(10);
        let mut doc = sample(t0);

        doc.mark_processed(t0);
        doc.mark_processed(t1);
        assert_eq!(doc.processed_at, Some(t0));
        assert_eq!(doc.updated_at, t1);

        doc.mark_published("content/posts/a.md".to_string(), t0);
        doc.mark_published("content/posts/b.md".to_string(), t1);
        assert_eq!(doc.published_at, Some(t0));
        assert_eq!(doc.published_file.as_deref(), Some("content/posts/b.md"));
    }

    #[test]
    fn test_image_ref_tagged() {
        let pending = ImageRef::Pending {
            id: "img".to_string(),
            data: "data:image/png;base64,AA==".to_string(),
        };
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["state"], "pending");
        assert!(pending.is_pending());
    }

    #[test]
    fn test_patch_accepts_partial_json() {
        let patch: MetadataPatch = serde_json::from_str(r#"{"tags":["x"]}"#).unwrap();
        assert_eq!(patch.tags, Some(vec!["x".to_string()]));
        assert!(patch.title.is_none());
        assert!(patch.images.is_empty());
    }
}
