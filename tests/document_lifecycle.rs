//! End-to-end lifecycle tests against a temporary project root.

use std::collections::HashSet;
use std::fs;
use std::thread;

use chrono::Local;
use draftpress::models::{DocumentSource, DocumentStatus, ImageRef, InlineImage, MetadataPatch};
use draftpress::repository::{Area, DocumentRepository, StorageLayout};
use tempfile::TempDir;

fn setup() -> (TempDir, DocumentRepository) {
    let dir = TempDir::new().unwrap();
    let layout = StorageLayout::new(dir.path());
    layout.ensure().unwrap();
    (dir, DocumentRepository::new(layout))
}

#[test]
fn test_import_assigns_unique_pending_ids() {
    let (_dir, repo) = setup();
    let mut ids = HashSet::new();
    for i in 0..20 {
        let doc = repo
            .import_content("a.md", &format!("# Post {}\n\nbody", i), DocumentSource::Manual)
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(ids.insert(doc.id));
    }
    assert_eq!(repo.list(None).unwrap().len(), 20);
}

#[test]
fn test_import_file_round_trip_is_byte_identical() {
    let (dir, repo) = setup();
    let source = "---\ntitle: Kept\n---\n\n# Heading  \n\n\n\ntrailing spaces   \n中文内容\n";
    let path = dir.path().join("draft.markdown");
    fs::write(&path, source).unwrap();

    let doc = repo.import_file(&path, DocumentSource::Manual).unwrap();
    assert_eq!(doc.title, "Kept");
    assert_eq!(doc.filename, "draft.markdown");

    let loaded = repo.get(&doc.id).unwrap();
    assert_eq!(loaded.content.as_bytes(), source.as_bytes());
    assert_eq!(loaded.size, source.len() as u64);
}

#[test]
fn test_import_file_rejects_missing_and_disallowed() {
    let (dir, repo) = setup();
    let missing = dir.path().join("nope.md");
    assert!(repo.import_file(&missing, DocumentSource::Manual).is_err());

    let pdf = dir.path().join("x.pdf");
    fs::write(&pdf, "content").unwrap();
    assert!(repo.import_file(&pdf, DocumentSource::Manual).is_err());
}

#[test]
fn test_process_moves_document_to_processed() {
    let (_dir, repo) = setup();
    let layout = repo.layout().clone();
    let doc = repo
        .import_content("a.md", "# Test\n\nbody", DocumentSource::WebUpload)
        .unwrap();
    assert!(layout.record_path(Area::Pending, &doc.id).exists());

    repo.process(&doc.id, &MetadataPatch::default()).unwrap();

    let loaded = repo.get(&doc.id).unwrap();
    assert_eq!(loaded.status, DocumentStatus::Processed);
    assert!(!layout.record_path(Area::Pending, &doc.id).exists());
    assert!(!layout.content_path(Area::Pending, &doc.id).exists());
    assert!(layout.record_path(Area::Processed, &doc.id).exists());
    assert!(layout.content_path(Area::Processed, &doc.id).exists());
}

#[test]
fn test_example_scenario() {
    let (dir, repo) = setup();
    let doc = repo
        .import_content("a.md", "# Test\n\nbody", DocumentSource::WebUpload)
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Pending);

    let patch = MetadataPatch {
        tags: Some(vec!["x".to_string()]),
        ..Default::default()
    };
    let processed = repo.process(&doc.id, &patch).unwrap();
    assert_eq!(processed.status, DocumentStatus::Processed);
    assert!(processed.content.contains("tags: [\"x\"]"));

    let published = repo.publish(&doc.id).unwrap();
    assert_eq!(published.status, DocumentStatus::Published);
    assert!(published.published_at.is_some());

    let name = format!("{}-Test.md", Local::now().format("%Y-%m-%d"));
    let path = dir.path().join("content/posts").join(&name);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("---\ntitle: \"Test\"\n"));
    assert!(text.contains("tags: [\"x\"]"));
    assert!(text.ends_with("\n\n# Test\n\nbody"));
    assert_eq!(
        published.published_file.as_deref(),
        Some(format!("content/posts/{}", name).as_str())
    );
}

#[test]
fn test_publish_uses_current_title() {
    let (dir, repo) = setup();
    let doc = repo
        .import_content("a.md", "# First\n\nbody", DocumentSource::Manual)
        .unwrap();
    repo.process(&doc.id, &MetadataPatch::default()).unwrap();
    repo.save(&doc.id, "Renamed Post", "# First\n\nbody edited").unwrap();

    let published = repo.publish(&doc.id).unwrap();
    let file = published.published_file.unwrap();
    assert!(file.ends_with("-Renamed-Post.md"), "{}", file);

    let text = fs::read_to_string(dir.path().join(&file)).unwrap();
    assert!(text.starts_with("---\ntitle: \"Renamed Post\"\n"));
    assert!(text.ends_with("body edited"));
}

#[test]
fn test_delete_after_publish_keeps_published_file() {
    let (dir, repo) = setup();
    let layout = repo.layout().clone();
    let doc = repo.save("doc_1_feedface", "Keep Me", "body").unwrap();
    let published = repo.publish(&doc.id).unwrap();
    let post = dir.path().join(published.published_file.unwrap());

    assert!(repo.delete(&doc.id).unwrap());
    assert!(!layout.record_path(Area::Processed, &doc.id).exists());
    assert!(!layout.content_path(Area::Processed, &doc.id).exists());
    assert!(post.exists());
    assert!(repo.get(&doc.id).unwrap_err().is_not_found());
    assert!(!repo.delete(&doc.id).unwrap());
}

#[test]
fn test_save_upserts() {
    let (_dir, repo) = setup();
    let layout = repo.layout().clone();

    // unknown id creates a processed editor document
    let created = repo.save("doc_2_00000000", "Fresh", "hello world").unwrap();
    assert_eq!(created.status, DocumentStatus::Processed);
    assert_eq!(created.source, DocumentSource::WebEditor);
    assert_eq!(created.filename, "doc_2_00000000.md");
    assert_eq!(created.word_count, 2);

    // pending document is promoted
    let pending = repo
        .import_content("p.md", "# P\n\nbody", DocumentSource::Manual)
        .unwrap();
    let promoted = repo.save(&pending.id, "P", "new body").unwrap();
    assert_eq!(promoted.status, DocumentStatus::Processed);
    assert_eq!(promoted.created_at, pending.created_at);
    assert!(!layout.record_path(Area::Pending, &pending.id).exists());
    assert!(!layout.content_path(Area::Pending, &pending.id).exists());

    // processed document is updated in place
    let updated = repo.save(&created.id, "Fresh", "one two three four").unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.processed_at, created.processed_at);
    assert!(updated.word_count > created.word_count);
    assert_eq!(repo.list(None).unwrap().len(), 2);
}

#[test]
fn test_list_orders_newest_first() {
    let (_dir, repo) = setup();
    let first = repo
        .import_content("a.md", "# A\n\nbody", DocumentSource::Manual)
        .unwrap();
    thread::sleep(std::time::Duration::from_millis(5));
    let second = repo
        .import_content("b.md", "# B\n\nbody", DocumentSource::Manual)
        .unwrap();

    let ids: Vec<_> = repo.list(None).unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn test_concurrent_saves_on_distinct_ids() {
    let (_dir, repo) = setup();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            thread::spawn(move || {
                let id = format!("doc_9_{:08x}", i);
                for round in 0..10 {
                    repo.save(&id, &format!("Post {}", i), &format!("body {} {}", i, round))
                        .unwrap();
                }
                id
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let id = handle.join().unwrap();
        let doc = repo.get(&id).unwrap();
        assert_eq!(doc.title, format!("Post {}", i));
        assert!(doc.content.ends_with(&format!("body {} 9", i)));
    }
    assert_eq!(repo.list(None).unwrap().len(), 8);
}

#[test]
fn test_inline_images_extracted_on_publish() {
    let (dir, repo) = setup();
    let body = "# Pics\n\n![dot](data:image/png;base64,aGVsbG8=)\n";
    let doc = repo
        .import_content("pics.md", body, DocumentSource::WebUpload)
        .unwrap();

    let patch = MetadataPatch {
        images: vec![InlineImage {
            id: None,
            data: "data:image/gif;base64,R0lGODlh".to_string(),
        }],
        ..Default::default()
    };
    let processed = repo.process(&doc.id, &patch).unwrap();
    assert_eq!(processed.pending_image_count(), 2);
    assert!(!processed.content.contains("base64"));
    assert!(processed
        .content
        .contains(&format!("![dot](inline-image:{}_img2)", doc.id)));

    let published = repo.publish(&doc.id).unwrap();
    assert_eq!(published.pending_image_count(), 0);

    let day = Local::now().format("%Y/%m/%d").to_string();
    for image in &published.images {
        let ImageRef::Stored { id, url } = image else {
            panic!("image not extracted: {:?}", image);
        };
        assert!(url.starts_with(&format!("/images/posts/{}/", day)));
        assert!(url.contains(id.as_str()));
        assert!(dir.path().join("static").join(&url[1..]).exists());
    }

    let text = fs::read_to_string(dir.path().join(published.published_file.unwrap())).unwrap();
    assert!(!text.contains("inline-image:"));
    assert!(text.contains(&format!("/images/posts/{}/{}_img2.png", day, doc.id)));
    assert_eq!(
        fs::read(
            dir.path()
                .join(format!("static/images/posts/{}/{}_img2.png", day, doc.id))
        )
        .unwrap(),
        b"hello"
    );
}

#[test]
fn test_recovery_after_interrupted_promotion() {
    let (_dir, repo) = setup();
    let layout = repo.layout().clone();
    let doc = repo
        .import_content("a.md", "# A\n\nbody", DocumentSource::Manual)
        .unwrap();
    let pending_record = fs::read(layout.record_path(Area::Pending, &doc.id)).unwrap();
    let pending_content = fs::read(layout.content_path(Area::Pending, &doc.id)).unwrap();
    repo.process(&doc.id, &MetadataPatch::default()).unwrap();

    // Simulate a crash before the pending copy was removed
    fs::write(layout.record_path(Area::Pending, &doc.id), pending_record).unwrap();
    fs::write(layout.content_path(Area::Pending, &doc.id), pending_content).unwrap();
    assert_eq!(repo.list(None).unwrap().len(), 1);
    assert_eq!(repo.get(&doc.id).unwrap().status, DocumentStatus::Processed);

    let report = layout.recover().unwrap();
    assert_eq!(report.duplicates_resolved, vec![doc.id.clone()]);
    assert!(!layout.record_path(Area::Pending, &doc.id).exists());
    assert_eq!(repo.get(&doc.id).unwrap().status, DocumentStatus::Processed);
}
