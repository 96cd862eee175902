//! Shared types, error model, and configuration for addonsync.
//!
//! This crate is the foundation depended on by all other addonsync crates.
//! It provides:
//! - [`SyncError`]: the unified error type
//! - Domain types ([`SourceRow`], [`AddonRecord`], [`ProjectId`], [`CurseforgeInfo`])
//! - Configuration ([`AppConfig`], [`SyncConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CurseforgeConfig, EnrichmentConfig, HttpConfig, ModrinthConfig, PathsConfig,
    SyncConfig, config_dir, config_file_path, curseforge_api_key, init_config, load_config,
    load_config_from,
};
pub use error::{Result, SyncError};
pub use types::{
    AddonRecord, CurseforgeAsset, CurseforgeAuthor, CurseforgeInfo, CurseforgeLinks,
    EnrichmentState, ModrinthInfo, ProjectId, SourceRow, columns,
};
