//! Error types for addonsync.
//!
//! Library crates use [`SyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only [`SyncError::Read`], [`SyncError::Write`] and [`SyncError::Config`]
//! are meant to abort a run. Resolution and registry failures are caught at
//! the per-record branch boundary and logged.

use std::path::PathBuf;

/// Top-level error type for all addonsync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Source table, cache file or document could not be read.
    #[error("read error at {path:?}: {message}")]
    Read { path: PathBuf, message: String },

    /// An output file could not be written.
    #[error("write error at {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    /// Project page could not be fetched during deep resolution.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A registry API call failed (network, auth, not-found, bad payload).
    #[error("{registry} fetch error: {message}")]
    RegistryFetch {
        registry: &'static str,
        message: String,
    },

    /// Network/HTTP client setup error.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed structured data (JSON, YAML, CSV).
    #[error("parse error: {message}")]
    Parse { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a read error for `path`.
    pub fn read(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a write error for `path`.
    pub fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a registry fetch error tagged with the registry name.
    pub fn registry(registry: &'static str, msg: impl Into<String>) -> Self {
        Self::RegistryFetch {
            registry,
            message: msg.into(),
        }
    }

    /// Whether this error should abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Read { .. } | Self::Write { .. }
        )
    }
}
