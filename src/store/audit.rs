//! Append-only audit log.
//!
//! A JSON array file rewritten whole on every append. Appending never fails
//! the calling operation: a save must not be lost because its log entry
//! could not be written.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{Category, Item};

/// A single audit entry: timestamp, action kind, and flattened metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub action: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append an entry. Errors are logged and swallowed.
    pub async fn append(&self, action: &str, metadata: serde_json::Map<String, Value>) {
        if let Err(e) = self.try_append(action, metadata).await {
            tracing::error!("Failed to append audit entry '{}': {}", action, e);
        } else {
            tracing::debug!("Audit entry added: {}", action);
        }
    }

    async fn try_append(
        &self,
        action: &str,
        metadata: serde_json::Map<String, Value>,
    ) -> Result<(), AppError> {
        let mut entries = self.read_all().await?;
        entries.push(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            metadata,
        });

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// The full entry sequence; an absent file reads as empty.
    pub async fn read_all(&self) -> Result<Vec<LogEntry>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Audit a successful save into `category`.
    pub async fn record_save(&self, category: Category, item: &Item) {
        let (action, metadata) = mutation_entry(category, item, true);
        self.append(action, metadata).await;
    }

    /// Audit a successful delete from `category`.
    pub async fn record_delete(&self, category: Category, item: &Item) {
        let (action, metadata) = mutation_entry(category, item, false);
        self.append(action, metadata).await;
    }
}

/// Message categories log author plus a text excerpt; the rest log a name or
/// title. Excerpts are capped at 50 characters.
fn mutation_entry(
    category: Category,
    item: &Item,
    created: bool,
) -> (&'static str, serde_json::Map<String, Value>) {
    let mut metadata = serde_json::Map::new();
    metadata.insert("category".to_string(), Value::from(category.as_str()));

    if category.is_message() {
        if let Some(author) = item.get("author").and_then(|v| v.as_str()) {
            metadata.insert("author".to_string(), Value::from(author));
        }
        if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
            metadata.insert("text".to_string(), Value::from(excerpt(text, 50)));
        }
        if created {
            ("message_created", metadata)
        } else {
            ("message_deleted", metadata)
        }
    } else {
        let name = item
            .get("name")
            .or_else(|| item.get("title"))
            .and_then(|v| v.as_str());
        if let Some(name) = name {
            metadata.insert("name".to_string(), Value::from(name));
        }
        if created {
            ("item_added", metadata)
        } else {
            ("item_deleted", metadata)
        }
    }
}

/// First `max` characters, respecting char boundaries.
fn excerpt(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn item(value: serde_json::Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("data/logs.json"));

        assert!(log.read_all().await.unwrap().is_empty());

        log.record_save(
            Category::ChiefMessages,
            &item(json!({"author": "chef", "text": "Bonjour à tous"})),
        )
        .await;
        log.record_delete(Category::Events, &item(json!({"title": "Gala"})))
            .await;

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "message_created");
        assert_eq!(entries[0].metadata["author"], "chef");
        assert_eq!(entries[1].action, "item_deleted");
        assert_eq!(entries[1].metadata["name"], "Gala");
        assert!(!entries[0].timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_text_excerpt_is_capped() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("logs.json"));

        let long = "é".repeat(80);
        log.record_save(
            Category::AmicalistMessages,
            &item(json!({"author": "ami", "text": long})),
        )
        .await;

        let entries = log.read_all().await.unwrap();
        let text = entries[0].metadata["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), 50);
    }

    #[tokio::test]
    async fn test_append_failure_is_swallowed() {
        // Point the log at a directory so the write fails
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().to_path_buf());

        log.append("login", serde_json::Map::new()).await;
    }

    #[test]
    fn test_non_message_metadata_prefers_name_over_title() {
        let (_, metadata) = mutation_entry(
            Category::Recruits,
            &item(json!({"name": "Dupont", "title": "ignored"})),
            true,
        );
        assert_eq!(metadata["name"], "Dupont");
    }
}
