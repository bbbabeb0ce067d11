//! Image commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::{ImageCategory, NewImage};
use crate::repository::ImageRepository;

/// Upload a local image file.
pub async fn cmd_upload(
    settings: &Settings,
    file: &Path,
    category: &str,
    subcategory: Option<String>,
    tags: Vec<String>,
    description: String,
) -> anyhow::Result<()> {
    let layout = settings.layout();
    layout.ensure()?;
    let repo = ImageRepository::new(layout);

    let bytes = tokio::fs::read(file).await?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    let mut image = NewImage::new(filename, ImageCategory::from_name(category));
    if let Some(sub) = subcategory {
        image.subcategory = sub;
    }
    image.tags = tags;
    image.description = description;

    let asset = repo.upload(&bytes, &image)?;
    println!(
        "{} Uploaded {} ({} bytes)",
        style("✓").green(),
        style(&asset.id).cyan(),
        asset.size
    );
    println!("  URL: {}", asset.url);
    Ok(())
}
