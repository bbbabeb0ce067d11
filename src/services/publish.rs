//! Publishing across the document and image repositories.

use tracing::warn;

use crate::models::Document;
use crate::repository::{DocumentRepository, ImageRepository, Result};

/// Publishes documents and records which uploaded images they reference.
#[derive(Debug, Clone)]
pub struct PublishService {
    documents: DocumentRepository,
    images: ImageRepository,
}

impl PublishService {
    pub fn new(documents: DocumentRepository, images: ImageRepository) -> Self {
        Self { documents, images }
    }

    /// Publish `id`. Image usage bookkeeping failures are logged, not
    /// returned, since the post is already on disk by then.
    pub fn publish(&self, id: &str) -> Result<Document> {
        let doc = self.documents.publish(id)?;
        if let Err(e) = self.images.record_usage(&doc.id, &doc.content) {
            warn!("Failed to record image usage for {}: {}", doc.id, e);
        }
        Ok(doc)
    }
}
