//! Content mutation endpoints.
//!
//! The only write path into the datastore. There is no update-in-place: the
//! frontend edits by delete-then-save of the full record.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::{MutationRequest, StatusResponse};
use crate::AppState;

/// POST /api/save - Append an item to a category (replace-all for flashNews).
pub async fn save(
    State(state): State<AppState>,
    Json(request): Json<MutationRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let category = state
        .store
        .save_item(&request.category, request.item.clone())
        .await?;

    state.audit.record_save(category, &request.item).await;
    Ok(Json(StatusResponse::success()))
}

/// POST /api/delete - Remove the first structurally-equal item.
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<MutationRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let category = state
        .store
        .delete_item(&request.category, &request.item)
        .await?;

    state.audit.record_delete(category, &request.item).await;
    Ok(Json(StatusResponse::success()))
}
