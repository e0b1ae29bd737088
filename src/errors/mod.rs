//! Error handling module for the amicale backend.
//!
//! Provides a central error type with mapping to HTTP status codes and the
//! `{"detail": ...}` envelope the frontend expects.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// `save` against a collection name that is not one of the five
    InvalidCategory(String),
    /// `delete` against a collection name that is not one of the five
    CategoryNotFound(String),
    /// `delete` target has no structurally-equal match
    ItemNotFound,
    /// Resource not found (e.g. freshness check before the first write)
    NotFound(String),
    /// Identity-provider call failed; message passed through verbatim
    UpstreamAuth(String),
    /// Token resolved but the profile is not validated
    Forbidden(String),
    /// Provider signalled a rate limit (signup attempts)
    RateLimited(String),
    /// Malformed request
    BadRequest(String),
    /// Disk read/write failure during load/save/log/upload
    Io(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
            AppError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ItemNotFound => StatusCode::NOT_FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamAuth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the human-readable detail message.
    pub fn detail(&self) -> String {
        match self {
            AppError::InvalidCategory(_) => "Invalid category".to_string(),
            AppError::CategoryNotFound(_) => "Category not found".to_string(),
            AppError::ItemNotFound => "Item not found".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::UpstreamAuth(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::RateLimited(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Io(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidCategory(name) => write!(f, "invalid category: {}", name),
            AppError::CategoryNotFound(name) => write!(f, "category not found: {}", name),
            AppError::ItemNotFound => write!(f, "item not found"),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::UpstreamAuth(msg) => write!(f, "upstream auth error: {}", msg),
            AppError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            AppError::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        AppError::Io(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Io(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Upstream request error: {:?}", err);
        AppError::UpstreamAuth(err.to_string())
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidCategory("nope".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CategoryNotFound("nope".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::ItemNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UpstreamAuth("bad token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Io("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_detail_messages_match_wire_contract() {
        assert_eq!(
            AppError::InvalidCategory("whatever".into()).detail(),
            "Invalid category"
        );
        assert_eq!(
            AppError::CategoryNotFound("whatever".into()).detail(),
            "Category not found"
        );
        assert_eq!(AppError::ItemNotFound.detail(), "Item not found");
    }
}
