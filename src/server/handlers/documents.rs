//! Document lifecycle handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::super::response::{ok, ApiError, ApiResult};
use super::super::AppState;
use super::{blocking, required};
use crate::models::{DocumentSource, DocumentStatus, MetadataPatch};

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub filename: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
    pub id: Option<String>,
    #[serde(flatten)]
    pub patch: MetadataPatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub id: Option<String>,
}

/// List documents, optionally filtered by `?status=`.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s.parse::<DocumentStatus>().map_err(ApiError::bad_request)?),
    };

    let docs = blocking(move || state.documents.list(status)).await?;
    Ok(ok(docs, None))
}

pub async fn get_document(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let doc = blocking(move || state.documents.get(&id)).await?;
    Ok(ok(doc, None))
}

pub async fn import_document(
    State(state): State<AppState>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let content = required(req.content, "content")?;
    let filename = req
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "document.md".to_string());

    let doc = blocking(move || {
        state
            .documents
            .import_content(&filename, &content, DocumentSource::WebUpload)
    })
    .await?;
    Ok(ok(doc, Some("document imported")))
}

pub async fn save_document(
    State(state): State<AppState>,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let id = required(req.id, "id")?;
    let content = required(req.content, "content")?;

    let doc = blocking(move || state.documents.save(&id, &req.title, &content)).await?;
    Ok(ok(doc, Some("document saved")))
}

pub async fn process_document(
    State(state): State<AppState>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let id = required(req.id, "id")?;
    let patch = req.patch;

    let doc = blocking(move || state.documents.process(&id, &patch)).await?;
    Ok(ok(doc, Some("document processed")))
}

pub async fn publish_document(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let id = required(req.id, "id")?;

    let publisher = state.publisher.clone();
    let doc = blocking(move || publisher.publish(&id)).await?;
    if state.rebuild_on_publish {
        state.rebuilder.trigger(&format!("published {}", doc.id));
    }
    Ok(ok(doc, Some("document published")))
}

pub async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let target = id.clone();
    let deleted = blocking(move || state.documents.delete(&target)).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("document not found: {}", id)));
    }
    Ok(ok(json!({ "id": id, "deleted": true }), Some("document deleted")))
}
