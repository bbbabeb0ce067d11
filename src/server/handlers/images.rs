//! Image asset handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use base64::Engine;
use serde::Deserialize;

use super::super::response::{ok, ApiError, ApiResult};
use super::super::AppState;
use super::{blocking, required};
use crate::models::{ImageCategory, NewImage};

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub filename: Option<String>,
    /// Base64 payload, optionally as a `data:` URI.
    pub data: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageListParams {
    pub category: Option<String>,
}

pub async fn upload_image(
    State(state): State<AppState>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let filename = required(req.filename, "filename")?;
    let data = required(req.data, "data")?;

    let payload = match data.split_once(',') {
        Some((header, rest)) if header.starts_with("data:") => rest,
        _ => data.as_str(),
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ApiError::bad_request(format!("invalid base64 data: {}", e)))?;

    let mut image = NewImage::new(
        filename,
        req.category
            .as_deref()
            .map(ImageCategory::from_name)
            .unwrap_or(ImageCategory::Temp),
    );
    if let Some(sub) = req.subcategory {
        image.subcategory = sub;
    }
    image.tags = req.tags;
    image.description = req.description;

    let asset = blocking(move || state.images.upload(&bytes, &image)).await?;
    Ok(ok(asset, Some("image uploaded")))
}

pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ImageListParams>,
) -> ApiResult {
    let category = params
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(ImageCategory::from_name);
    let images = blocking(move || state.images.list(category)).await?;
    Ok(ok(images, None))
}

pub async fn get_image(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let asset = blocking(move || state.images.get(&id)).await?;
    Ok(ok(asset, None))
}
