//! Document lifecycle commands.

use std::io::{self, Write};
use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::{Document, DocumentSource, DocumentStatus, MetadataPatch};
use crate::repository::{DocumentRepository, ImageRepository};
use crate::services::{PublishService, SiteRebuilder};

use super::super::helpers::truncate;

fn repository(settings: &Settings) -> anyhow::Result<DocumentRepository> {
    let layout = settings.layout();
    layout.ensure()?;
    Ok(DocumentRepository::new(layout))
}

/// Import a local file.
pub async fn cmd_import(
    settings: &Settings,
    file: &Path,
    source: DocumentSource,
) -> anyhow::Result<()> {
    let repo = repository(settings)?;
    let doc = repo.import_file(file, source)?;

    println!(
        "{} Imported '{}' as {}",
        style("✓").green(),
        doc.title,
        style(&doc.id).cyan()
    );
    println!("  {} words, {} bytes", doc.word_count, doc.size);
    Ok(())
}

/// List documents, optionally by status.
pub async fn cmd_list(settings: &Settings, status: Option<DocumentStatus>) -> anyhow::Result<()> {
    let repo = repository(settings)?;
    let docs = repo.list(status)?;

    if docs.is_empty() {
        println!("{} No documents found", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Documents").bold());
    println!("{}", "-".repeat(90));
    println!(
        "{:<26} {:<36} {:<10} {:>6} Created",
        "ID", "Title", "Status", "Words"
    );
    println!("{}", "-".repeat(90));

    for doc in &docs {
        println!(
            "{:<26} {:<36} {:<10} {:>6} {}",
            doc.id,
            truncate(&doc.title, 35),
            doc.status.as_str(),
            doc.word_count,
            doc.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} document(s)", docs.len());
    Ok(())
}

/// Show a document's record.
pub async fn cmd_show(settings: &Settings, id: &str, with_content: bool) -> anyhow::Result<()> {
    let repo = repository(settings)?;
    let doc = repo.get(id)?;
    print_document(&doc);

    if with_content {
        println!("\n{}", doc.content);
    }
    Ok(())
}

/// Process a pending document.
pub async fn cmd_process(settings: &Settings, id: &str, patch: MetadataPatch) -> anyhow::Result<()> {
    let repo = repository(settings)?;
    let doc = repo.process(id, &patch)?;

    println!("{} Processed {}", style("✓").green(), style(&doc.id).cyan());
    if doc.pending_image_count() > 0 {
        println!(
            "  {} inline image(s) will be extracted on publish",
            doc.pending_image_count()
        );
    }
    Ok(())
}

/// Publish a processed document.
pub async fn cmd_publish(settings: &Settings, id: &str, rebuild: bool) -> anyhow::Result<()> {
    let layout = settings.layout();
    layout.ensure()?;
    let publisher = PublishService::new(
        DocumentRepository::new(layout.clone()),
        ImageRepository::new(layout),
    );
    let doc = publisher.publish(id)?;

    println!(
        "{} Published {} to {}",
        style("✓").green(),
        style(&doc.id).cyan(),
        doc.published_file.as_deref().unwrap_or("?")
    );

    if rebuild || settings.rebuild_on_publish {
        let rebuilder =
            SiteRebuilder::new(settings.rebuild_url.clone(), settings.rebuild_timeout());
        super::site::report_rebuild(rebuilder.run().await);
    }
    Ok(())
}

/// Delete a document after confirmation.
pub async fn cmd_delete(settings: &Settings, id: &str, confirm: bool) -> anyhow::Result<()> {
    let repo = repository(settings)?;
    let doc = match repo.get(id) {
        Ok(doc) => doc,
        Err(e) if e.is_not_found() => {
            println!("{} Document '{}' not found", style("✗").red(), id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if !confirm {
        print!(
            "Delete '{}' ({})? Published files are kept. [y/N] ",
            doc.title,
            doc.status.as_str()
        );
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{} Cancelled", style("!").yellow());
            return Ok(());
        }
    }

    repo.delete(id)?;
    println!("{} Deleted {}", style("✓").green(), id);
    Ok(())
}

fn print_document(doc: &Document) {
    println!("\n{}", style(&doc.title).bold());
    println!("{}", "-".repeat(50));
    println!("{:<14} {}", "ID:", doc.id);
    println!("{:<14} {}", "Filename:", doc.filename);
    println!("{:<14} {}", "Status:", doc.status.as_str());
    println!("{:<14} {}", "Source:", doc.source.as_str());
    println!("{:<14} {}", "Words:", doc.word_count);
    println!("{:<14} {} bytes", "Size:", doc.size);
    println!("{:<14} {}", "Created:", doc.created_at.to_rfc3339());
    println!("{:<14} {}", "Updated:", doc.updated_at.to_rfc3339());
    if let Some(at) = doc.processed_at {
        println!("{:<14} {}", "Processed:", at.to_rfc3339());
    }
    if let Some(at) = doc.published_at {
        println!("{:<14} {}", "Published:", at.to_rfc3339());
    }
    if let Some(file) = &doc.published_file {
        println!("{:<14} {}", "File:", file);
    }
    if let Some(fm) = &doc.front_matter {
        if !fm.tags.is_empty() {
            println!("{:<14} {}", "Tags:", fm.tags.join(", "));
        }
        if !fm.categories.is_empty() {
            println!("{:<14} {}", "Categories:", fm.categories.join(", "));
        }
    }
    if !doc.images.is_empty() {
        println!(
            "{:<14} {} ({} queued)",
            "Images:",
            doc.images.len(),
            doc.pending_image_count()
        );
    }
}
