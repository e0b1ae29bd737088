use amicale_backend::config::Config;
use amicale_backend::{build_state, create_router, poller};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Amicale Content Backend");
    tracing::info!("Datastore path: {:?}", config.db_path);
    tracing::info!("Upload directory: {:?}", config.upload_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the identity provider is not configured
    if config.supabase_url.is_none() || config.supabase_key.is_none() {
        tracing::warn!(
            "Supabase not configured (SUPABASE_URL/SUPABASE_KEY). Auth endpoints will fail!"
        );
    }

    // Ensure the uploads directory exists
    tokio::fs::create_dir_all(&config.upload_dir).await.ok();

    let state = build_state(config.clone());

    // Background sweep of expired flash news
    poller::spawn_flash_news_sweeper(state.store.clone(), config.sweep_interval);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
