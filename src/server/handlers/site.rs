//! Health and site rebuild handlers.

use axum::extract::State;
use serde_json::json;

use super::super::response::{ok, ApiResult};
use super::super::AppState;

pub async fn health() -> ApiResult {
    Ok(ok(
        json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        None,
    ))
}

/// Fire the rebuild hook and return without waiting for it.
pub async fn rebuild(State(state): State<AppState>) -> ApiResult {
    let enabled = state.rebuilder.is_enabled();
    state.rebuilder.trigger("requested via API");
    let message = if enabled {
        "rebuild triggered"
    } else {
        "no rebuild hook configured"
    };
    Ok(ok(json!({ "triggered": enabled }), Some(message)))
}
