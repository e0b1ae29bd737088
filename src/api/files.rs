//! Image upload endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::UploadResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// POST /api/upload?filename=... - Store raw body bytes under the uploads
/// directory. The stored name is generated; only the extension of the
/// supplied filename survives.
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }

    let path = state.store.store_upload(&query.filename, &body).await?;
    tracing::info!("Stored upload as {}", path);
    Ok(Json(UploadResponse { path }))
}
