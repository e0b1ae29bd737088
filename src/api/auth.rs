//! Delegated auth endpoints: pass-through to the identity provider.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value;

use super::bearer_token;
use crate::auth::SupabaseClient;
use crate::errors::AppError;
use crate::models::{CredentialsRequest, LoginResponse, SessionResponse, UserProfile};
use crate::AppState;

fn require_supabase(state: &AppState) -> Result<&SupabaseClient, AppError> {
    state
        .supabase
        .as_deref()
        .ok_or_else(|| AppError::Io("Supabase not configured".to_string()))
}

fn provider_email(state: &AppState, username: &str) -> String {
    format!("{}@{}", username, state.config.auth_email_domain)
}

/// POST /api/auth/login - Password grant, mirrored back with the profile row.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let supabase = require_supabase(&state)?;
    let email = provider_email(&state, &request.username);

    let session = supabase.sign_in(&email, &request.password).await?;

    // Profile lookup failures fall back to an unvalidated default
    let profile = supabase.get_profile(&session.user.id).await.ok().flatten();
    let (username, is_validated) = match profile {
        Some(p) => (
            p.username.unwrap_or_else(|| request.username.clone()),
            p.is_validated,
        ),
        None => (request.username.clone(), false),
    };

    let mut metadata = serde_json::Map::new();
    metadata.insert("username".to_string(), Value::from(username.clone()));
    state.audit.append("login", metadata).await;

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        user: UserProfile {
            id: session.user.id,
            email: session.user.email,
            username,
            is_validated,
        },
    }))
}

/// POST /api/auth/signup - Register with the provider, then best-effort
/// creation of the unvalidated profile row.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<Value>, AppError> {
    let supabase = require_supabase(&state)?;
    let email = provider_email(&state, &request.username);

    let user = match supabase.sign_up(&email, &request.password).await {
        Ok(user) => user,
        Err(AppError::UpstreamAuth(msg)) => {
            let lower = msg.to_lowercase();
            if lower.contains("rate limit") || lower.contains("too many requests") {
                return Err(AppError::RateLimited(
                    "Trop de tentatives d'inscription. Veuillez réessayer plus tard.".to_string(),
                ));
            }
            return Err(AppError::BadRequest(msg));
        }
        Err(e) => return Err(e),
    };

    if let Some(user) = user {
        if let Err(e) = supabase.insert_profile(&user.id, &request.username).await {
            tracing::error!("Profile creation error: {}", e);
        }
    }

    let mut metadata = serde_json::Map::new();
    metadata.insert("username".to_string(), Value::from(request.username));
    state.audit.append("signup", metadata).await;

    Ok(Json(serde_json::json!({
        "message": "Signup successful! Admin validation required."
    })))
}

/// GET /api/auth/session - Resolve a bearer token to its user and profile.
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let supabase = require_supabase(&state)?;
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::UpstreamAuth("Missing or invalid token".to_string()))?;

    let user = supabase.get_user(&token).await?;
    let profile = supabase.get_profile(&user.id).await.ok().flatten();

    let fallback_username = user
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .unwrap_or_default()
        .to_string();
    let (username, is_validated) = match profile {
        Some(p) => (p.username.unwrap_or(fallback_username), p.is_validated),
        None => (fallback_username, false),
    };

    Ok(Json(SessionResponse {
        user: UserProfile {
            id: user.id,
            email: user.email,
            username,
            is_validated,
        },
    }))
}
