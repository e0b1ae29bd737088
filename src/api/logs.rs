//! Audit log endpoint, restricted to validated users.

use axum::{extract::State, http::HeaderMap, Json};

use super::bearer_token;
use crate::errors::AppError;
use crate::store::audit::LogEntry;
use crate::AppState;

/// GET /api/logs - The append-only audit log as a JSON array. Requires a
/// bearer token resolving to a validated profile.
pub async fn get_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::UpstreamAuth("Missing or invalid token".to_string()))?;

    let supabase = state
        .supabase
        .as_ref()
        .ok_or_else(|| AppError::Io("Supabase not configured".to_string()))?;

    let user = supabase.get_user(&token).await?;
    let validated = supabase
        .get_profile(&user.id)
        .await?
        .map(|profile| profile.is_validated)
        .unwrap_or(false);

    if !validated {
        return Err(AppError::Forbidden("Accès refusé".to_string()));
    }

    Ok(Json(state.audit.read_all().await?))
}
