//! Delegated authentication via Supabase.
//!
//! The backend holds no credential logic of its own: it forwards credentials
//! to GoTrue and mirrors back the session token plus the profile row
//! (username, validation flag) from PostgREST. Provider error messages are
//! passed through verbatim.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// User record as returned by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Row from the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_validated: bool,
}

/// A successful password-grant session.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInSession {
    pub access_token: String,
    pub user: ProviderUser,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    user: Option<ProviderUser>,
    // Older GoTrue versions return the user at the top level
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Thin REST client for the Supabase auth and data APIs.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Password grant against GoTrue.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInSession, AppError> {
        let resp = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.base_url
            ))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let resp = check_provider_response(resp).await?;
        Ok(resp.json().await?)
    }

    /// Register a new account. The provider may or may not return a user
    /// record depending on its email-confirmation settings.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<ProviderUser>, AppError> {
        let resp = self
            .http
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let resp = check_provider_response(resp).await?;
        let body: SignUpResponse = resp.json().await?;
        Ok(body.user.or(body.id.map(|id| ProviderUser {
            id,
            email: body.email,
        })))
    }

    /// Resolve a bearer token to its user.
    pub async fn get_user(&self, token: &str) -> Result<ProviderUser, AppError> {
        let resp = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::UpstreamAuth("Invalid token".to_string()));
        }
        Ok(resp.json().await?)
    }

    /// Fetch a user's profile row, or `None` if it does not exist.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, AppError> {
        let resp = self
            .http
            .get(format!("{}/rest/v1/profiles", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "username,is_validated"),
                ("id", &format!("eq.{}", user_id)),
            ])
            .send()
            .await?;

        let resp = check_provider_response(resp).await?;
        let mut rows: Vec<ProfileRow> = resp.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Create the profile row for a fresh signup (not yet validated).
    pub async fn insert_profile(&self, user_id: &str, username: &str) -> Result<(), AppError> {
        let resp = self
            .http
            .post(format!("{}/rest/v1/profiles", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!([
                { "id": user_id, "username": username, "is_validated": false }
            ]))
            .send()
            .await?;

        check_provider_response(resp).await?;
        Ok(())
    }
}

/// Map a non-success provider response to `UpstreamAuth`, carrying whatever
/// message the provider put in its body.
async fn check_provider_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("Provider error ({})", status));
    Err(AppError::UpstreamAuth(message))
}
