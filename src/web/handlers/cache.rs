//! Cache management handlers

use axum::{extract::State, response::Response};
use tracing::info;

use crate::errors::AppError;
use crate::web::{
    AppState,
    responses::{ClearCacheResponse, handle_error, ok},
};

/// Confirmation message returned by `POST /clear`
pub const CACHE_CLEARED_MESSAGE: &str = "cache has been cleared";

/// Remove every cached preview from memory and disk
pub async fn clear_cache(State(state): State<AppState>) -> Response {
    match state.preview.clear_cache().await {
        Ok(cleared_entries) => {
            info!(cleared_entries, "Image cache cleared via API");
            ok(ClearCacheResponse {
                message: CACHE_CLEARED_MESSAGE.to_string(),
                cleared_entries,
            })
        }
        Err(e) => handle_error(AppError::Cache(e)),
    }
}
