//! File-backed persistence for addonsync.
//!
//! - [`table`]: lazy CSV reader and the in-place id rewriter
//! - [`cache`]: the persistent name → project id cache
//! - [`document`]: YAML document emitter and the downstream loader
//!
//! Every writer replaces its target through [`write_atomic`], so a crash
//! mid-write leaves the previous file intact.

pub mod cache;
pub mod document;
pub mod table;

use std::path::Path;

use addonsync_shared::{Result, SyncError};
use tracing::debug;
use uuid::Uuid;

pub use cache::IdentifierCache;
pub use document::{DocumentValue, ToDocument, emit_document, load_document, render_document};
pub use table::{RewriteSummary, TableReader, read_rows, rewrite_ids};

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::write(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| SyncError::write(path, "path has no file name"))?;
    let tmp = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::now_v7()
    ));

    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SyncError::write(path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SyncError::write(path, e));
    }

    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_replaces_and_leaves_no_temp_files() {
        let dir = std::env::temp_dir().join(format!("addonsync-atomic-{}", Uuid::now_v7()));
        let path = dir.join("nested").join("out.txt");

        write_atomic(&path, b"first").await.expect("first write");
        write_atomic(&path, b"second").await.expect("second write");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn write_atomic_into_a_file_path_fails_as_write_error() {
        let dir = std::env::temp_dir().join(format!("addonsync-atomic-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let err = write_atomic(&blocker.join("out.txt"), b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Write { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
