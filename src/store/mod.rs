//! Content store: a single JSON document on disk holding the five content
//! collections, mutated only through whole-file read-modify-write cycles.
//!
//! The write gate is a mutex scoped to this component and held across the
//! entire load-mutate-write sequence. It is advisory and in-process only: it
//! serializes writers inside one server instance and has no effect across
//! processes or machines. There is no timeout; a stuck holder blocks all
//! writers. Reads are not serialized against writes, so a reader may observe
//! a document mid-write; each mutation is a single whole-file write to keep
//! that window small.

pub mod audit;

pub use audit::AuditLog;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Local, NaiveDateTime};
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::{Category, ContentDb, Item};

/// JSON-file datastore with an in-process write gate.
pub struct ContentStore {
    db_path: PathBuf,
    site_root: PathBuf,
    upload_dir: PathBuf,
    write_gate: Mutex<()>,
}

impl ContentStore {
    pub fn new(db_path: PathBuf, site_root: PathBuf, upload_dir: PathBuf) -> Self {
        Self {
            db_path,
            site_root,
            upload_dir,
            write_gate: Mutex::new(()),
        }
    }

    /// Load the current document. An absent file yields five empty
    /// collections; the file itself is created on the first mutation.
    pub async fn load(&self) -> Result<ContentDb, AppError> {
        match tokio::fs::read(&self.db_path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ContentDb::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the full document back. Caller must hold the write gate.
    async fn persist(&self, db: &ContentDb) -> Result<(), AppError> {
        if let Some(parent) = self.db_path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
        let json = serde_json::to_string_pretty(db)?;
        tokio::fs::write(&self.db_path, json).await?;
        Ok(())
    }

    /// Append `item` to `category`, or replace the whole collection for
    /// `flashNews` (there is at most one active announcement at a time).
    pub async fn save_item(&self, category: &str, item: Item) -> Result<Category, AppError> {
        let category = Category::parse(category)
            .ok_or_else(|| AppError::InvalidCategory(category.to_string()))?;

        let _gate = self.write_gate.lock().await;
        let mut db = self.load().await?;

        let collection = db.collection_mut(category);
        if category == Category::FlashNews {
            collection.clear();
        }
        collection.push(item);

        self.persist(&db).await?;
        Ok(category)
    }

    /// Remove the first item structurally equal to `item` from `category`.
    ///
    /// Matching is exact field-for-field equality; two field-identical records
    /// are indistinguishable, and any difference introduced by round-tripping
    /// yields `ItemNotFound`. The client edits by delete-then-save of the full
    /// record, so this is the wire contract.
    pub async fn delete_item(&self, category: &str, item: &Item) -> Result<Category, AppError> {
        let category = Category::parse(category)
            .ok_or_else(|| AppError::CategoryNotFound(category.to_string()))?;

        let _gate = self.write_gate.lock().await;
        let mut db = self.load().await?;

        let collection = db.collection_mut(category);
        let index = collection
            .iter()
            .position(|existing| existing == item)
            .ok_or(AppError::ItemNotFound)?;
        collection.remove(index);

        self.persist(&db).await?;
        self.remove_image_file(item).await;
        Ok(category)
    }

    /// Best-effort deletion of the uploaded file an item's `image` field
    /// points at. Absence is expected (never uploaded, already removed);
    /// other I/O errors are logged and do not fail the delete.
    async fn remove_image_file(&self, item: &Item) {
        let Some(rel) = item.get("image").and_then(|v| v.as_str()) else {
            return;
        };
        if rel.is_empty() {
            return;
        }
        let path = self.site_root.join(rel);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!("Removed image file {:?}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove image file {:?}: {}", path, e),
        }
    }

    /// Drop flash-news entries whose `endTime` has passed, returning how many
    /// were dropped. Entries without an `endTime` are kept forever; an
    /// unparseable `endTime` counts as expired. The document is rewritten
    /// only when something was dropped.
    pub async fn sweep_expired_flash_news(
        &self,
        now: DateTime<Local>,
    ) -> Result<usize, AppError> {
        let _gate = self.write_gate.lock().await;
        let mut db = self.load().await?;

        let before = db.flash_news.len();
        db.flash_news.retain(|item| match item.get("endTime") {
            None => true,
            Some(v) => match v.as_str().and_then(parse_item_time) {
                Some(end) => end > now,
                None => false,
            },
        });

        let dropped = before - db.flash_news.len();
        if dropped > 0 {
            self.persist(&db).await?;
        }
        Ok(dropped)
    }

    /// The datastore file's mtime as fractional seconds since the epoch.
    /// This is the sole change-detection signal exposed to clients.
    pub async fn last_modified(&self) -> Result<f64, AppError> {
        let meta = match tokio::fs::metadata(&self.db_path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound("DB not found".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let mtime = meta.modified()?;
        let since_epoch = mtime
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Io(format!("mtime before epoch: {}", e)))?;
        Ok(since_epoch.as_secs_f64())
    }

    /// Store uploaded bytes under a generated name, keeping only the
    /// sanitized extension of the supplied filename. Returns the relative
    /// path to use as an `image` field value.
    pub async fn store_upload(&self, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let stored_name = match sanitized_extension(filename) {
            Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
            None => uuid::Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(self.upload_dir.join(&stored_name), bytes).await?;

        let rel_dir = self
            .upload_dir
            .strip_prefix(&self.site_root)
            .unwrap_or_else(|_| Path::new("assets/images"));
        let rel = rel_dir.join(&stored_name);
        Ok(rel.to_string_lossy().replace('\\', "/"))
    }
}

/// Parse an item timestamp. The frontend writes `datetime-local` strings
/// (`%Y-%m-%dT%H:%M`, no zone, interpreted as local time); RFC 3339 is
/// accepted first for values produced elsewhere.
pub fn parse_item_time(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return naive.and_local_timezone(Local).single();
        }
    }
    None
}

/// Alphanumeric extension of at most 8 chars, lowercased; anything else is
/// discarded along with the rest of the user-supplied name.
fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ContentStore {
        ContentStore::new(
            dir.path().join("data/db.json"),
            dir.path().to_path_buf(),
            dir.path().join("assets/images"),
        )
    }

    fn item(value: serde_json::Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_load_absent_file_yields_empty_collections() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let db = store.load().await.unwrap();
        assert!(db.chief_messages.is_empty());
        assert!(db.flash_news.is_empty());
        // Lazy creation: no file until the first mutation
        assert!(store.last_modified().await.is_err());
    }

    #[tokio::test]
    async fn test_save_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .save_item("events", item(json!({"date": "1 Jan", "title": "Gala"})))
            .await
            .unwrap();
        store
            .save_item("events", item(json!({"date": "2 Feb", "title": "Loto"})))
            .await
            .unwrap();

        let db = store.load().await.unwrap();
        assert_eq!(db.events.len(), 2);
        assert_eq!(db.events[1]["title"], "Loto");
    }

    #[tokio::test]
    async fn test_save_invalid_category() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .save_item("weather", item(json!({"text": "sunny"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCategory(_)));
    }

    #[tokio::test]
    async fn test_flash_news_save_replaces() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .save_item("flashNews", item(json!({"text": "First"})))
            .await
            .unwrap();
        store
            .save_item("flashNews", item(json!({"text": "Second"})))
            .await
            .unwrap();

        let db = store.load().await.unwrap();
        assert_eq!(db.flash_news.len(), 1);
        assert_eq!(db.flash_news[0]["text"], "Second");
    }

    #[tokio::test]
    async fn test_delete_removes_first_match_and_is_idempotent_failing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let gala = item(json!({"date": "1 Jan", "title": "Gala", "description": "desc"}));
        store.save_item("events", gala.clone()).await.unwrap();
        store.delete_item("events", &gala).await.unwrap();

        let db = store.load().await.unwrap();
        assert!(db.events.is_empty());

        let err = store.delete_item("events", &gala).await.unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound));
    }

    #[tokio::test]
    async fn test_delete_then_resave_repositions_at_end() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = item(json!({"title": "A"}));
        let second = item(json!({"title": "B"}));
        store.save_item("recruits", first.clone()).await.unwrap();
        store.save_item("recruits", second).await.unwrap();

        store.delete_item("recruits", &first).await.unwrap();
        store.save_item("recruits", first).await.unwrap();

        let db = store.load().await.unwrap();
        assert_eq!(db.recruits.len(), 2);
        assert_eq!(db.recruits[0]["title"], "B");
        assert_eq!(db.recruits[1]["title"], "A");
    }

    #[tokio::test]
    async fn test_delete_unknown_category() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .delete_item("weather", &item(json!({"text": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_referenced_image_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let img_dir = dir.path().join("assets/images");
        tokio::fs::create_dir_all(&img_dir).await.unwrap();
        let img_path = img_dir.join("photo.png");
        tokio::fs::write(&img_path, b"png").await.unwrap();

        let with_image = item(json!({"title": "Gala", "image": "assets/images/photo.png"}));
        store.save_item("events", with_image.clone()).await.unwrap();
        store.delete_item("events", &with_image).await.unwrap();

        assert!(!img_path.exists());
    }

    #[tokio::test]
    async fn test_delete_tolerates_absent_image_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let with_image = item(json!({"title": "Gala", "image": "assets/images/gone.png"}));
        store.save_item("events", with_image.clone()).await.unwrap();
        store.delete_item("events", &with_image).await.unwrap();

        let db = store.load().await.unwrap();
        assert!(db.events.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_keeps_future_and_timeless_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let now = Local::now();

        let future = (now + Duration::hours(1)).format("%Y-%m-%dT%H:%M").to_string();
        store
            .save_item("flashNews", item(json!({"text": "Soon", "endTime": future})))
            .await
            .unwrap();
        assert_eq!(store.sweep_expired_flash_news(now).await.unwrap(), 0);

        store
            .save_item("flashNews", item(json!({"text": "Forever"})))
            .await
            .unwrap();
        assert_eq!(store.sweep_expired_flash_news(now).await.unwrap(), 0);
        assert_eq!(store.load().await.unwrap().flash_news.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_expired_and_unparseable_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let now = Local::now();

        let past = (now - Duration::hours(1)).format("%Y-%m-%dT%H:%M").to_string();
        store
            .save_item("flashNews", item(json!({"text": "Old", "endTime": past})))
            .await
            .unwrap();
        assert_eq!(store.sweep_expired_flash_news(now).await.unwrap(), 1);
        assert!(store.load().await.unwrap().flash_news.is_empty());

        store
            .save_item("flashNews", item(json!({"text": "Bad", "endTime": "not a date"})))
            .await
            .unwrap();
        assert_eq!(store.sweep_expired_flash_news(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_modified_changes_after_save() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .save_item("events", item(json!({"title": "One"})))
            .await
            .unwrap();
        let first = store.last_modified().await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        store
            .save_item("events", item(json!({"title": "Two"})))
            .await
            .unwrap();
        let second = store.last_modified().await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_store_upload_generates_name_and_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let path = store.store_upload("../../etc/passwd.PNG", b"img").await.unwrap();
        assert!(path.starts_with("assets/images/"));
        assert!(path.ends_with(".png"));
        assert!(!path.contains(".."));
        assert!(dir.path().join(&path).exists());

        // No usable extension at all
        let bare = store.store_upload("noext", b"img").await.unwrap();
        assert!(!bare.contains('.'));
    }

    #[test]
    fn test_parse_item_time_formats() {
        assert!(parse_item_time("2026-08-30T14:05").is_some());
        assert!(parse_item_time("2026-08-30T14:05:30").is_some());
        assert!(parse_item_time("2026-08-30T14:05:30+02:00").is_some());
        assert!(parse_item_time("tomorrow").is_none());
        assert!(parse_item_time("").is_none());
    }
}
