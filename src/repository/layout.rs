//! On-disk directory convention.
//!
//! ```text
//! {root}/admin/pending/{id}.json|md     imported drafts
//! {root}/admin/processed/{id}.json|md   processed and published drafts
//! {root}/admin/images/{id}.json         image metadata
//! {root}/static/images/...              image bytes
//! {root}/content/posts/{date}-{slug}.md published output
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use super::{record_ids, remove_if_exists, RepositoryError, Result, TEMP_PREFIX};

/// Default gallery subcategories created with the layout.
const GALLERY_SUBCATEGORIES: [&str; 3] = ["photography", "screenshots", "misc"];

/// A lifecycle area holding document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Pending,
    Processed,
}

impl Area {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }
}

/// What [`StorageLayout::recover`] cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Ids found in both areas; the pending copy was removed.
    pub duplicates_resolved: Vec<String>,
    /// Content files with no record beside them.
    pub orphans_removed: Vec<PathBuf>,
    pub temp_files_removed: usize,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates_resolved.is_empty()
            && self.orphans_removed.is_empty()
            && self.temp_files_removed == 0
    }
}

/// Paths for a project root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn admin_dir(&self) -> PathBuf {
        self.root.join("admin")
    }

    pub fn area_dir(&self, area: Area) -> PathBuf {
        self.admin_dir().join(area.dir_name())
    }

    pub fn record_path(&self, area: Area, id: &str) -> PathBuf {
        self.area_dir(area).join(format!("{}.json", id))
    }

    pub fn content_path(&self, area: Area, id: &str) -> PathBuf {
        self.area_dir(area).join(format!("{}.md", id))
    }

    pub fn image_records_dir(&self) -> PathBuf {
        self.admin_dir().join("images")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    pub fn static_images_dir(&self) -> PathBuf {
        self.static_dir().join("images")
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join("content").join("posts")
    }

    /// Date-partitioned directory for images extracted at publish time,
    /// relative to `static/images`.
    pub fn inline_images_rel(date: NaiveDate) -> String {
        format!(
            "posts/{:04}/{:02}/{:02}",
            date.year(),
            date.month(),
            date.day()
        )
    }

    /// Path relative to the project root, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Create every directory of the layout. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        let mut dirs = vec![
            self.area_dir(Area::Pending),
            self.area_dir(Area::Processed),
            self.image_records_dir(),
            self.posts_dir(),
            self.static_images_dir().join("posts"),
            self.static_images_dir().join("documents"),
            self.static_images_dir().join("temp"),
        ];
        for sub in GALLERY_SUBCATEGORIES {
            dirs.push(self.static_images_dir().join("gallery").join(sub));
        }

        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|e| RepositoryError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Repair state left behind by an interrupted write.
    ///
    /// A record is the commit marker of a write, so:
    /// - an id with records in both areas keeps the processed copy;
    /// - a content file with no record beside it is removed;
    /// - leftover temporary files are removed.
    pub fn recover(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();

        let processed: HashSet<String> = record_ids(&self.area_dir(Area::Processed))?
            .into_iter()
            .collect();
        for id in record_ids(&self.area_dir(Area::Pending))? {
            if processed.contains(&id) {
                warn!("Document {} present in pending and processed, keeping processed", id);
                remove_if_exists(&self.record_path(Area::Pending, &id))?;
                remove_if_exists(&self.content_path(Area::Pending, &id))?;
                report.duplicates_resolved.push(id);
            }
        }

        for area in [Area::Pending, Area::Processed] {
            self.sweep_area(area, &mut report)?;
        }
        report.temp_files_removed += remove_temp_files(&self.image_records_dir())?;
        report.temp_files_removed += remove_temp_files(&self.posts_dir())?;

        if !report.is_clean() {
            info!(
                "Recovery: {} duplicates, {} orphans, {} temp files",
                report.duplicates_resolved.len(),
                report.orphans_removed.len(),
                report.temp_files_removed
            );
        }
        Ok(report)
    }

    fn sweep_area(&self, area: Area, report: &mut RecoveryReport) -> Result<()> {
        let dir = self.area_dir(area);
        report.temp_files_removed += remove_temp_files(&dir)?;

        let records: HashSet<String> = record_ids(&dir)?.into_iter().collect();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(RepositoryError::io(&dir, e)),
        };
        for entry in entries {
            let path = entry.map_err(|e| RepositoryError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !records.contains(stem) {
                warn!("Removing orphaned content file {}", path.display());
                remove_if_exists(&path)?;
                report.orphans_removed.push(path);
            }
        }
        Ok(())
    }
}

fn remove_temp_files(dir: &Path) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(RepositoryError::io(dir, e)),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| RepositoryError::io(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX)
            && remove_if_exists(&entry.path())?
        {
            removed += 1;
        }
    }
    Ok(removed)
}
