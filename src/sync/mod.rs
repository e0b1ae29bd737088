//! Client-side change detection against the freshness endpoint.
//!
//! Polls `/api/last-modified` and fires a reload callback when the observed
//! timestamp differs from the last recorded one. The first successful
//! observation only records the timestamp, so a watcher started right after
//! initial load does not trigger a spurious reload. Failed polls are
//! swallowed and retried on the next tick; the loop runs until dropped.

use std::time::Duration;

use crate::models::LastModified;

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// First successful observation; recorded without firing a reload.
    Initial(f64),
    /// Timestamp differs from the last recorded one; reload.
    Changed(f64),
    /// Timestamp unchanged.
    Unchanged,
    /// Network or HTTP failure; retry next tick.
    Unavailable,
}

/// Polling watcher over a server's freshness endpoint.
pub struct ChangeWatcher {
    http: reqwest::Client,
    endpoint: String,
    last_seen: Option<f64>,
}

impl ChangeWatcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/last-modified", base_url.trim_end_matches('/')),
            last_seen: None,
        }
    }

    /// Fetch the freshness endpoint once and classify the observation.
    pub async fn poll_once(&mut self) -> Observation {
        let observed = match self.fetch().await {
            Some(ts) => ts,
            None => return Observation::Unavailable,
        };

        match self.last_seen {
            None => {
                self.last_seen = Some(observed);
                Observation::Initial(observed)
            }
            Some(prev) if prev != observed => {
                self.last_seen = Some(observed);
                Observation::Changed(observed)
            }
            Some(_) => Observation::Unchanged,
        }
    }

    async fn fetch(&self) -> Option<f64> {
        // Cache-busting query parameter, as the browser client does
        let bust = chrono::Utc::now().timestamp_millis();
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("t", bust)])
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => match resp.json::<LastModified>().await {
                Ok(body) => Some(body.last_modified),
                Err(e) => {
                    tracing::debug!("Malformed freshness response: {}", e);
                    None
                }
            },
            Ok(resp) => {
                tracing::debug!("Freshness check returned {}", resp.status());
                None
            }
            Err(e) => {
                tracing::debug!("Freshness check failed: {}", e);
                None
            }
        }
    }

    /// Poll on a fixed interval, invoking `on_change` exactly once per
    /// observed change, for as long as the future is polled.
    pub async fn run<F>(mut self, interval: Duration, mut on_change: F)
    where
        F: FnMut(f64),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Observation::Changed(ts) = self.poll_once().await {
                tracing::info!("Content changed (mtime {}), reloading", ts);
                on_change(ts);
            }
        }
    }
}
