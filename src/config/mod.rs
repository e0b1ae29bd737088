//! Configuration module for the amicale backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Site root; relative `image` paths and static routes resolve under it
    pub site_root: PathBuf,
    /// Path to the JSON content datastore
    pub db_path: PathBuf,
    /// Path to the append-only audit log
    pub log_path: PathBuf,
    /// Directory for uploaded images
    pub upload_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Supabase project URL (auth disabled when absent)
    pub supabase_url: Option<String>,
    /// Supabase anon key
    pub supabase_key: Option<String>,
    /// Domain appended to usernames to form provider email addresses
    pub auth_email_domain: String,
    /// Interval between flash-news expiry sweeps
    pub sweep_interval: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let site_root: PathBuf = env::var("AMICALE_SITE_ROOT")
            .unwrap_or_else(|_| ".".to_string())
            .into();

        let db_path = env::var("AMICALE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| site_root.join("data/db.json"));

        let log_path = env::var("AMICALE_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| site_root.join("data/logs.json"));

        let upload_dir = env::var("AMICALE_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| site_root.join("assets/images"));

        let bind_addr = env::var("AMICALE_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8001".to_string())
            .parse()
            .expect("Invalid AMICALE_BIND_ADDR format");

        let supabase_url = env::var("SUPABASE_URL").ok();
        let supabase_key = env::var("SUPABASE_KEY").ok();

        let auth_email_domain =
            env::var("AMICALE_AUTH_EMAIL_DOMAIN").unwrap_or_else(|_| "tmc.com".to_string());

        let sweep_interval = Duration::from_secs(
            env::var("AMICALE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        );

        let log_level = env::var("AMICALE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            site_root,
            db_path,
            log_path,
            upload_dir,
            bind_addr,
            supabase_url,
            supabase_key,
            auth_email_domain,
            sweep_interval,
            log_level,
        }
    }
}
