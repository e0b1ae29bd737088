//! Amicale Website Content Backend
//!
//! A small REST backend over a single JSON-file datastore, with delegated
//! Supabase authentication and polling-based change detection.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod poller;
pub mod store;
pub mod sync;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use auth::SupabaseClient;
use config::Config;
use store::{AuditLog, ContentStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub audit: Arc<AuditLog>,
    pub supabase: Option<Arc<SupabaseClient>>,
    pub config: Arc<Config>,
}

/// Assemble the shared application state from a configuration.
pub fn build_state(config: Config) -> AppState {
    let store = Arc::new(ContentStore::new(
        config.db_path.clone(),
        config.site_root.clone(),
        config.upload_dir.clone(),
    ));
    let audit = Arc::new(AuditLog::new(config.log_path.clone()));

    let supabase = match (&config.supabase_url, &config.supabase_key) {
        (Some(url), Some(key)) => Some(Arc::new(SupabaseClient::new(url.clone(), key.clone()))),
        _ => None,
    };

    AppState {
        store,
        audit,
        supabase,
        config: Arc::new(config),
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Content mutation
        .route("/save", post(api::save))
        .route("/delete", post(api::delete))
        .route("/upload", post(api::upload))
        // Change detection
        .route("/last-modified", get(api::last_modified))
        // Audit log (validated users only)
        .route("/logs", get(api::get_logs))
        // Delegated auth
        .route("/auth/login", post(api::login))
        .route("/auth/signup", post(api::signup))
        .route("/auth/session", get(api::session));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // The content document itself is served statically and cache-busted by
    // the caller; uploaded images live under /assets.
    let data_dir = state.config.site_root.join("data");
    let assets_dir = state.config.site_root.join("assets");

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .nest_service("/data", ServeDir::new(data_dir))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
