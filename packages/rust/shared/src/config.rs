//! Application configuration for addonsync.
//!
//! User config lives at `~/.addonsync/addonsync.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "addonsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".addonsync";

// ---------------------------------------------------------------------------
// Config structs (matching addonsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Enrichment behavior.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Shared HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// CurseForge API settings.
    #[serde(default)]
    pub curseforge: CurseforgeConfig,

    /// Modrinth API settings.
    #[serde(default)]
    pub modrinth: ModrinthConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source catalog table (rewritten in place with resolved ids).
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Output YAML document.
    #[serde(default = "default_document")]
    pub document: PathBuf,

    /// Persistent name → project id cache.
    #[serde(default = "default_id_cache")]
    pub id_cache: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            document: default_document(),
            id_cache: default_id_cache(),
        }
    }
}

fn default_source() -> PathBuf {
    "src/data/data.csv".into()
}
fn default_document() -> PathBuf {
    "src/data/addons.yaml".into()
}
fn default_id_cache() -> PathBuf {
    "src/data/ids.json".into()
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum number of records enriched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Scrape CurseForge project pages for ids missing from the table and cache.
    #[serde(default)]
    pub deep_resolution: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            deep_resolution: false,
        }
    }
}

fn default_concurrency() -> usize {
    16
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[curseforge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurseforgeConfig {
    /// API root.
    #[serde(default = "default_curseforge_api")]
    pub api_base: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CurseforgeConfig {
    fn default() -> Self {
        Self {
            api_base: default_curseforge_api(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_curseforge_api() -> String {
    "https://api.curseforge.com".into()
}
fn default_api_key_env() -> String {
    "CF_TOKEN".into()
}

/// `[modrinth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModrinthConfig {
    /// API root.
    #[serde(default = "default_modrinth_api")]
    pub api_base: String,
}

impl Default for ModrinthConfig {
    fn default() -> Self {
        Self {
            api_base: default_modrinth_api(),
        }
    }
}

fn default_modrinth_api() -> String {
    "https://api.modrinth.com".into()
}

// ---------------------------------------------------------------------------
// Sync config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime sync configuration: merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Source catalog table.
    pub source_path: PathBuf,
    /// Output YAML document.
    pub document_path: PathBuf,
    /// Persistent id cache.
    pub id_cache_path: PathBuf,
    /// Maximum records in flight.
    pub concurrency: usize,
    /// Whether to scrape project pages for unknown ids.
    pub deep_resolution: bool,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// CurseForge API root.
    pub curseforge_api_base: String,
    /// Modrinth API root.
    pub modrinth_api_base: String,
}

impl From<&AppConfig> for SyncConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            source_path: config.paths.source.clone(),
            document_path: config.paths.document.clone(),
            id_cache_path: config.paths.id_cache.clone(),
            concurrency: config.enrichment.concurrency,
            deep_resolution: config.enrichment.deep_resolution,
            http_timeout_secs: config.http.timeout_secs,
            curseforge_api_base: config.curseforge.api_base.clone(),
            modrinth_api_base: config.modrinth.api_base.clone(),
        }
    }
}

impl SyncConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SyncError::config("enrichment concurrency must be at least 1"));
        }
        if self.http_timeout_secs == 0 {
            return Err(SyncError::config("http timeout must be at least 1 second"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.addonsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.addonsync/addonsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::read(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SyncError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SyncError::write(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| SyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SyncError::write(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the CurseForge API key from the configured env var.
///
/// There is no fallback key: an unset or empty variable is a config error.
pub fn curseforge_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.curseforge.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(SyncError::config(format!(
            "CurseForge API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://console.curseforge.com/"
        ))),
    }
}
