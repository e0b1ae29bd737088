//! Background sweep of expired flash news.
//!
//! The only mutation not triggered by a request. A failed tick is logged and
//! skipped; the schedule continues for the lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;

use crate::store::ContentStore;

/// Spawn the sweeper task. Each tick drops flash-news entries whose
/// `endTime` has passed.
pub fn spawn_flash_news_sweeper(store: Arc<ContentStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so a fresh start does not
        // race request handlers during boot.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.sweep_expired_flash_news(Local::now()).await {
                Ok(0) => {}
                Ok(dropped) => tracing::info!("Cleaned up {} expired flash news", dropped),
                Err(e) => tracing::error!("Flash news sweep failed: {}", e),
            }
        }
    })
}
