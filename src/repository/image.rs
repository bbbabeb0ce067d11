//! Image asset repository.
//!
//! Bytes go under `static/images/{category}/...` and metadata under
//! `admin/images/{id}.json`. As with documents, the record is written last.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::document::helpers::generate_id;
use super::layout::StorageLayout;
use super::{read_json, record_ids, validate_id, write_atomic, write_json, RepositoryError, Result};
use crate::models::{ImageAsset, ImageCategory, NewImage};

static IMAGE_URL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/images/[A-Za-z0-9_/.-]*?(img_[0-9]+_[0-9a-f]{8})\.[A-Za-z0-9]+")
        .expect("valid image url regex")
});

/// File-backed image repository.
#[derive(Debug, Clone)]
pub struct ImageRepository {
    layout: StorageLayout,
}

impl ImageRepository {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Store uploaded image bytes and their metadata record.
    pub fn upload(&self, bytes: &[u8], image: &NewImage) -> Result<ImageAsset> {
        if bytes.is_empty() {
            return Err(RepositoryError::validation(format!(
                "image is empty: {}",
                image.filename
            )));
        }
        let subcategory = match image.subcategory.trim() {
            "" => NewImage::DEFAULT_SUBCATEGORY,
            sub => sub,
        };
        if image.category == ImageCategory::Gallery {
            validate_id(subcategory)?;
        }

        let id = generate_id("img");
        let ext = extension_for(&image.filename, bytes);
        let stored_filename = format!("{}.{}", id, ext);

        let rel_dir = match image.category {
            ImageCategory::Documents => "documents".to_string(),
            ImageCategory::Gallery => format!("gallery/{}", subcategory),
            ImageCategory::Temp => "temp".to_string(),
        };
        let dir = self.layout.static_images_dir().join(&rel_dir);
        fs::create_dir_all(&dir).map_err(|e| RepositoryError::io(&dir, e))?;
        write_atomic(&dir.join(&stored_filename), bytes)?;

        let path = format!("images/{}/{}", rel_dir, stored_filename);
        let asset = ImageAsset {
            url: format!("/{}", path),
            path,
            id,
            filename: image.filename.clone(),
            stored_filename,
            category: image.category,
            subcategory: subcategory.to_string(),
            tags: image.tags.clone(),
            description: image.description.clone(),
            size: bytes.len() as u64,
            mime_type: mime_guess::from_ext(&ext)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            content_hash: hex::encode(Sha256::digest(bytes)),
            upload_time: Utc::now(),
            used_in_documents: Vec::new(),
        };

        write_json(&self.record_path(&asset.id), &asset)?;
        info!(
            "Uploaded image {} ({}, {} bytes) to {}",
            asset.id, asset.filename, asset.size, asset.url
        );
        Ok(asset)
    }

    /// List image records, newest first, optionally filtered by category.
    pub fn list(&self, category: Option<ImageCategory>) -> Result<Vec<ImageAsset>> {
        let dir = self.layout.image_records_dir();
        let mut images = Vec::new();
        for id in record_ids(&dir)? {
            match read_json::<ImageAsset>(&self.record_path(&id)) {
                Ok(asset) => {
                    if category.is_none() || category == Some(asset.category) {
                        images.push(asset);
                    }
                }
                Err(e) => warn!("Skipping unreadable image record {}: {}", id, e),
            }
        }
        images.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        Ok(images)
    }

    pub fn get(&self, id: &str) -> Result<ImageAsset> {
        validate_id(id)?;
        let path = self.record_path(id);
        if !path.exists() {
            return Err(RepositoryError::not_found(format!("image not found: {}", id)));
        }
        read_json(&path)
    }

    /// Record that `doc_id` references the uploaded images whose URLs appear
    /// in `content`. Returns the ids of the records that changed.
    pub fn record_usage(&self, doc_id: &str, content: &str) -> Result<Vec<String>> {
        let mut updated = Vec::new();
        for caps in IMAGE_URL_ID_RE.captures_iter(content) {
            let image_id = &caps[1];
            let path = self.record_path(image_id);
            if !path.exists() || updated.iter().any(|u| u == image_id) {
                continue;
            }

            let mut asset: ImageAsset = read_json(&path)?;
            if asset.used_in_documents.iter().any(|d| d == doc_id) {
                continue;
            }
            asset.used_in_documents.push(doc_id.to_string());
            write_json(&path, &asset)?;
            updated.push(image_id.to_string());
        }
        if !updated.is_empty() {
            debug!("Document {} references images {:?}", doc_id, updated);
        }
        Ok(updated)
    }

    fn record_path(&self, id: &str) -> std::path::PathBuf {
        self.layout.image_records_dir().join(format!("{}.json", id))
    }
}

/// Extension from the filename, else sniffed from the bytes.
fn extension_for(filename: &str, bytes: &[u8]) -> String {
    let from_name = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));
    from_name
        .or_else(|| infer::get(bytes).map(|kind| kind.extension().to_string()))
        .unwrap_or_else(|| "bin".to_string())
}
