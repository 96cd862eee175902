//! Persistent name → project id cache.
//!
//! The in-memory [`IdentifierCache`] is what the resolver sees; [`load`] and
//! [`flush`] are the only functions that touch the JSON file on disk.

use std::collections::BTreeMap;
use std::path::Path;

use addonsync_shared::{ProjectId, Result, SyncError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::write_atomic;

/// Shared, mutable id cache keyed by addon name.
///
/// Entries are kept sorted so a flushed file is stable across runs.
#[derive(Debug, Default)]
pub struct IdentifierCache {
    entries: Mutex<BTreeMap<String, ProjectId>>,
}

impl IdentifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, ProjectId>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub async fn get(&self, name: &str) -> Option<ProjectId> {
        self.entries.lock().await.get(name).cloned()
    }

    /// Record `id` for `name`, replacing any previous entry.
    pub async fn insert(&self, name: &str, id: ProjectId) {
        self.entries.lock().await.insert(name.to_string(), id);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Copy of the current entries.
    pub async fn snapshot(&self) -> BTreeMap<String, ProjectId> {
        self.entries.lock().await.clone()
    }
}

/// Load the cache file at `path`.
///
/// A missing file yields an empty cache. A file that exists but cannot be
/// read or parsed is a [`SyncError::Read`], so a damaged cache is never
/// silently replaced by the end-of-run flush.
pub async fn load(path: &Path) -> Result<IdentifierCache> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no id cache found, starting fresh");
            return Ok(IdentifierCache::new());
        }
        Err(e) => return Err(SyncError::read(path, e)),
    };

    let entries: BTreeMap<String, ProjectId> = if content.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str(&content)
            .map_err(|e| SyncError::read(path, format!("invalid id cache: {e}")))?
    };

    info!(path = %path.display(), entries = entries.len(), "loaded id cache");
    Ok(IdentifierCache::from_entries(entries))
}

/// Write the cache to `path` as pretty JSON, replacing the file.
pub async fn flush(path: &Path, cache: &IdentifierCache) -> Result<()> {
    let entries = cache.snapshot().await;
    let mut json = serde_json::to_string_pretty(&entries)
        .map_err(|e| SyncError::write(path, e))?;
    json.push('\n');

    write_atomic(path, json.as_bytes()).await?;
    info!(path = %path.display(), entries = entries.len(), "flushed id cache");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path(name: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("addonsync-cache-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        (dir, path)
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_cache() {
        let (dir, path) = temp_path("ids.json");
        let cache = load(&path).await.expect("load missing cache");
        assert!(cache.is_empty().await);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_read_error() {
        let (dir, path) = temp_path("ids.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, SyncError::Read { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn flush_then_load_roundtrip() {
        let (dir, path) = temp_path("ids.json");
        std::fs::write(&path, r#"{"Bar": "999", "Legacy": 12345}"#).unwrap();

        let cache = load(&path).await.expect("load");
        assert_eq!(cache.get("Bar").await, Some(ProjectId::new("999")));
        assert_eq!(cache.get("Legacy").await, Some(ProjectId::new("12345")));

        cache.insert("Alpha", ProjectId::new("1")).await;
        flush(&path, &cache).await.expect("flush");

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"Alpha\": \"1\",\n  \"Bar\": \"999\",\n  \"Legacy\": \"12345\"\n}\n"
        );

        let reloaded = load(&path).await.expect("reload");
        assert_eq!(reloaded.len().await, 3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn insert_overwrites_previous_entry() {
        let cache = IdentifierCache::new();
        cache.insert("Foo", ProjectId::new("1")).await;
        cache.insert("Foo", ProjectId::new("2")).await;
        assert_eq!(cache.get("Foo").await, Some(ProjectId::new("2")));
        assert_eq!(cache.len().await, 1);
    }
}
