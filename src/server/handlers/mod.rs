//! Route handlers.

pub mod documents;
pub mod images;
pub mod site;

use super::response::ApiError;

/// Run blocking repository work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::repository::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Treat a missing or blank string field as a validation failure.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("missing required field: {}", field))),
    }
}
