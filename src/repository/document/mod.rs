//! Document repository over the flat-file layout.
//!
//! A document lives in exactly one lifecycle area at a time:
//! - `pending`: freshly imported, content stored verbatim
//! - `processed`: front matter generated; stays here once published
//!
//! Every write stores the content file first and the JSON record last, so
//! the record is the commit point. Moving a document between areas is a
//! two-phase operation: the new copy is committed, then the old copy is
//! removed. A crash between the phases leaves both copies on disk, which
//! [`StorageLayout::recover`] resolves in favour of the processed copy.
//!
//! There is no locking. Operations on the same id must be serialized by the
//! caller; operations on different ids touch disjoint files.

pub(crate) mod helpers;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

pub use helpers::{check_date, check_extension, generate_doc_id, ALLOWED_EXTENSIONS};
use helpers::{file_stem, set_content};

use super::layout::{Area, StorageLayout};
use super::{
    read_json, read_text, record_ids, remove_if_exists, validate_id, write_atomic, write_json,
    RepositoryError, Result,
};
use crate::models::{
    Document, DocumentSource, DocumentStatus, FrontMatter, ImageRef, MetadataPatch,
};
use crate::services::content;

/// File-backed document repository.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    layout: StorageLayout,
}

impl DocumentRepository {
    /// Create a repository over `layout`. Directories are not created here;
    /// call [`StorageLayout::ensure`] once at startup.
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get a document by id, preferring the processed copy.
    pub fn get(&self, id: &str) -> Result<Document> {
        validate_id(id)?;
        match self.locate(id) {
            Some(area) => self.load(area, id),
            None => Err(RepositoryError::not_found(format!(
                "document not found: {}",
                id
            ))),
        }
    }

    /// List documents from both areas, newest first.
    ///
    /// Unreadable records are logged and skipped.
    pub fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
        let mut seen = HashSet::new();
        let mut docs = Vec::new();

        for area in [Area::Processed, Area::Pending] {
            for id in record_ids(&self.layout.area_dir(area))? {
                if !seen.insert(id.clone()) {
                    continue;
                }
                let path = self.layout.record_path(area, &id);
                match read_json::<Document>(&path) {
                    Ok(doc) => {
                        if status.is_none() || status == Some(doc.status) {
                            docs.push(doc);
                        }
                    }
                    Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
                }
            }
        }

        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(
            "Listed {} documents (status: {})",
            docs.len(),
            status.map(|s| s.as_str()).unwrap_or("all")
        );
        Ok(docs)
    }

    fn locate(&self, id: &str) -> Option<Area> {
        [Area::Processed, Area::Pending]
            .into_iter()
            .find(|area| self.layout.record_path(*area, id).exists())
    }

    fn load(&self, area: Area, id: &str) -> Result<Document> {
        let mut doc: Document = match read_json(&self.layout.record_path(area, id)) {
            Ok(doc) => doc,
            Err(RepositoryError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                return Err(RepositoryError::not_found(format!(
                    "document not found: {}",
                    id
                )));
            }
            Err(e) => return Err(e),
        };

        let content_path = self.layout.content_path(area, id);
        if content_path.exists() {
            doc.content = read_text(&content_path)?;
        }
        Ok(doc)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Import a markdown or text file into the pending area.
    pub fn import_file(&self, path: &Path, source: DocumentSource) -> Result<Document> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RepositoryError::validation(format!("invalid file path: {}", path.display()))
            })?;
        check_extension(filename)?;

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::validation(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(RepositoryError::validation(format!(
                    "file is not valid UTF-8: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(RepositoryError::io(path, e)),
        };

        self.import_content(filename, &text, source)
    }

    /// Import raw content under `filename` into the pending area.
    pub fn import_content(
        &self,
        filename: &str,
        text: &str,
        source: DocumentSource,
    ) -> Result<Document> {
        check_extension(filename)?;
        if text.trim().is_empty() {
            return Err(RepositoryError::validation(format!(
                "file is empty: {}",
                filename
            )));
        }

        let now = Utc::now();
        let filename = content::sanitize_filename(filename);
        let title = content::extract_title(text).unwrap_or_else(|| file_stem(&filename));
        let mut doc = blank_document(generate_doc_id(), filename, title, source, now);
        set_content(&mut doc, text.to_string());

        self.store(Area::Pending, &doc)?;
        info!("Imported document {} ({})", doc.id, doc.filename);
        Ok(doc)
    }

    /// Apply `patch`, generate front matter and move the document from
    /// pending to processed.
    pub fn process(&self, id: &str, patch: &MetadataPatch) -> Result<Document> {
        validate_id(id)?;
        if !self.layout.record_path(Area::Pending, id).exists() {
            return Err(RepositoryError::not_found(format!(
                "pending document not found: {}",
                id
            )));
        }
        if let Some(date) = &patch.date {
            check_date(date)?;
        }
        for image in &patch.images {
            if let Some(image_id) = &image.id {
                validate_id(image_id)?;
            }
        }

        let mut doc = self.load(Area::Pending, id)?;
        let now = Utc::now();

        if let Some(title) = patch.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            doc.title = title.to_string();
        }
        let mut fm = doc
            .front_matter
            .take()
            .unwrap_or_else(|| FrontMatter::new(doc.title.clone(), now));
        fm.title = doc.title.clone();
        if let Some(date) = &patch.date {
            fm.date = date.clone();
        }
        if let Some(draft) = patch.draft {
            fm.draft = draft;
        }
        if let Some(tags) = &patch.tags {
            fm.tags = tags.clone();
        }
        if let Some(categories) = &patch.categories {
            fm.categories = categories.clone();
        }
        if let Some(description) = &patch.description {
            fm.description = description.clone();
        }

        for image in &patch.images {
            let image_id = image
                .id
                .clone()
                .unwrap_or_else(|| format!("{}_img{}", doc.id, doc.images.len() + 1));
            doc.images.push(ImageRef::Pending {
                id: image_id,
                data: image.data.clone(),
            });
        }
        let (body, lifted) = content::lift_inline_images(
            content::strip_front_matter(&doc.content),
            &doc.id,
            doc.images.len(),
        );
        doc.images.extend(lifted);

        set_content(&mut doc, content::compose(&fm, &body));
        doc.front_matter = Some(fm);
        doc.mark_processed(now);

        self.store(Area::Processed, &doc)?;
        self.remove_area(Area::Pending, id)?;
        info!(
            "Processed document {} ({} images queued)",
            doc.id,
            doc.pending_image_count()
        );
        Ok(doc)
    }

    /// Write a processed document to `content/posts/{date}-{slug}.md`.
    ///
    /// Queued inline images are extracted under
    /// `static/images/posts/YYYY/MM/DD/`. Publishing again writes a new file
    /// and records its path; a file at a previous path is left in place.
    pub fn publish(&self, id: &str) -> Result<Document> {
        validate_id(id)?;
        if !self.layout.record_path(Area::Processed, id).exists() {
            return Err(RepositoryError::not_found(format!(
                "processed document not found: {}",
                id
            )));
        }

        let mut doc = self.load(Area::Processed, id)?;
        let today = Local::now();
        let slug = match content::slugify(&doc.title) {
            s if s.is_empty() => doc.id.clone(),
            s => s,
        };
        let filename = format!("{}-{}.md", today.format("%Y-%m-%d"), slug);

        self.extract_images(&mut doc, today.date_naive())?;
        let mut text = doc.content.clone();
        for image in &doc.images {
            if let ImageRef::Stored { id, url } = image {
                text = text.replace(
                    &format!("({})", content::placeholder(id)),
                    &format!("({})", url),
                );
            }
        }

        let published_path = self.layout.posts_dir().join(&filename);
        write_atomic(&published_path, text.as_bytes())?;

        let relative = self.layout.relative(&published_path);
        if let Some(previous) = doc.published_file.as_deref() {
            if previous != relative {
                debug!("Document {} previously published to {}", doc.id, previous);
            }
        }
        set_content(&mut doc, text);
        doc.mark_published(relative, Utc::now());

        self.store(Area::Processed, &doc)?;
        info!("Published document {} to {}", doc.id, filename);
        Ok(doc)
    }

    /// Upsert editor content.
    ///
    /// A front matter block at the top of `text` is merged over the stored
    /// one; a non-blank `title` overrides both. Processed documents are updated in place, pending ones are promoted to
    /// processed, and unknown ids create a new processed document.
    pub fn save(&self, id: &str, title: &str, text: &str) -> Result<Document> {
        validate_id(id)?;
        let now = Utc::now();

        let (mut doc, promoted) = match self.locate(id) {
            Some(Area::Processed) => (self.load(Area::Processed, id)?, false),
            Some(Area::Pending) => (self.load(Area::Pending, id)?, true),
            None => {
                let title = content::extract_title(text).unwrap_or_else(|| id.to_string());
                let doc = blank_document(
                    id.to_string(),
                    format!("{}.md", id),
                    title,
                    DocumentSource::WebEditor,
                    now,
                );
                (doc, false)
            }
        };

        // Keys in the submitted block win; stored values fill the gaps
        let mut fm = doc
            .front_matter
            .clone()
            .unwrap_or_else(|| FrontMatter::new(doc.title.clone(), now));
        fm.title = doc.title.clone();
        content::merge_front_matter(&mut fm, text);
        if !title.trim().is_empty() {
            fm.title = title.trim().to_string();
        }
        check_date(&fm.date)?;
        doc.title = fm.title.clone();

        let (body, lifted) = content::lift_inline_images(
            content::strip_front_matter(text),
            &doc.id,
            doc.images.len(),
        );
        doc.images.extend(lifted);

        set_content(&mut doc, content::compose(&fm, &body));
        doc.front_matter = Some(fm);
        doc.mark_processed(now);

        self.store(Area::Processed, &doc)?;
        if promoted {
            self.remove_area(Area::Pending, id)?;
        }
        info!("Saved document {}", doc.id);
        Ok(doc)
    }

    /// Delete a document from whichever areas hold it.
    ///
    /// Published files are not touched.
    pub fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        let mut deleted = false;
        for area in [Area::Pending, Area::Processed] {
            deleted |= self.remove_area(area, id)?;
        }
        if deleted {
            info!("Deleted document {}", id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // File helpers
    // ========================================================================

    /// Write content then record. The record write commits.
    fn store(&self, area: Area, doc: &Document) -> Result<()> {
        write_atomic(
            &self.layout.content_path(area, &doc.id),
            doc.content.as_bytes(),
        )?;
        write_json(&self.layout.record_path(area, &doc.id), doc)
    }

    /// Remove record then content, returning whether anything existed.
    fn remove_area(&self, area: Area, id: &str) -> Result<bool> {
        let record = remove_if_exists(&self.layout.record_path(area, id))?;
        let content = remove_if_exists(&self.layout.content_path(area, id))?;
        Ok(record || content)
    }

    fn extract_images(&self, doc: &mut Document, date: NaiveDate) -> Result<()> {
        if doc.pending_image_count() == 0 {
            return Ok(());
        }

        let rel_dir = StorageLayout::inline_images_rel(date);
        let dir = self.layout.static_images_dir().join(&rel_dir);
        fs::create_dir_all(&dir).map_err(|e| RepositoryError::io(&dir, e))?;

        let doc_id = doc.id.clone();
        for image in doc.images.iter_mut() {
            let ImageRef::Pending { id, data } = image else {
                continue;
            };
            let Some((ext, bytes)) = content::decode_data_uri(data) else {
                warn!("Could not decode inline image {} of document {}", id, doc_id);
                continue;
            };

            let file = format!("{}.{}", id, ext);
            write_atomic(&dir.join(&file), &bytes)?;
            let url = format!("/images/{}/{}", rel_dir, file);
            debug!("Extracted image {} ({} bytes) to {}", id, bytes.len(), url);
            let stored = ImageRef::Stored {
                id: id.clone(),
                url,
            };
            *image = stored;
        }
        Ok(())
    }
}

fn blank_document(
    id: String,
    filename: String,
    title: String,
    source: DocumentSource,
    now: DateTime<Utc>,
) -> Document {
    Document {
        id,
        filename,
        title,
        content: String::new(),
        status: DocumentStatus::Pending,
        source,
        created_at: now,
        updated_at: now,
        processed_at: None,
        published_at: None,
        size: 0,
        word_count: 0,
        images: Vec::new(),
        front_matter: None,
        published_file: None,
    }
}
