//! Freshness endpoint.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::LastModified;
use crate::AppState;

/// GET /api/last-modified - The datastore file's mtime, for client polling.
pub async fn last_modified(
    State(state): State<AppState>,
) -> Result<Json<LastModified>, AppError> {
    let last_modified = state.store.last_modified().await?;
    Ok(Json(LastModified { last_modified }))
}
