//! HTTP clients for the two addon registries.
//!
//! - [`CurseforgeClient`]: authenticated mod lookup by numeric project id
//! - [`ModrinthClient`]: public project lookup by slug
//!
//! Both sit behind a trait ([`CurseforgeApi`], [`ModrinthApi`]) so the
//! orchestrator can be driven by in-memory fakes. Failures surface as
//! [`SyncError::RegistryFetch`]; the `lookup_*` wrappers log them against
//! the addon name and turn them into `None`.

mod curseforge;
mod modrinth;

use std::time::Duration;

use addonsync_shared::{CurseforgeInfo, ModrinthInfo, ProjectId, Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

pub use curseforge::CurseforgeClient;
pub use modrinth::{ModrinthClient, STRIPPED_FIELDS, slug_from_link, strip_volatile_fields};

/// Maximum number of redirects to follow on API calls.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("addonsync/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the API clients.
fn build_client(registry: &'static str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SyncError::Network(format!("failed to build {registry} client: {e}")))
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Registry A: mod descriptors keyed by numeric project id.
#[async_trait]
pub trait CurseforgeApi: Send + Sync {
    async fn get_mod(&self, id: &ProjectId) -> Result<CurseforgeInfo>;
}

/// Registry B: project descriptors keyed by slug.
#[async_trait]
pub trait ModrinthApi: Send + Sync {
    async fn get_project(&self, slug: &str) -> Result<ModrinthInfo>;
}

// ---------------------------------------------------------------------------
// Lookup wrappers
// ---------------------------------------------------------------------------

/// Fetch the CurseForge block for `addon`, logging and swallowing failures.
pub async fn lookup_curseforge(
    api: &dyn CurseforgeApi,
    addon: &str,
    id: &ProjectId,
) -> Option<CurseforgeInfo> {
    match api.get_mod(id).await {
        Ok(info) => {
            debug!(addon, %id, "fetched curseforge metadata");
            Some(info)
        }
        Err(e) => {
            error!(addon, %id, error = %e, "curseforge lookup failed");
            None
        }
    }
}

/// Fetch the Modrinth block for `addon` from its project `link`.
pub async fn lookup_modrinth(api: &dyn ModrinthApi, addon: &str, link: &str) -> Option<ModrinthInfo> {
    let Some(slug) = slug_from_link(link) else {
        error!(addon, link, "could not derive modrinth slug from link");
        return None;
    };

    match api.get_project(&slug).await {
        Ok(info) => {
            debug!(addon, slug = %slug, "fetched modrinth metadata");
            Some(info)
        }
        Err(e) => {
            error!(addon, slug = %slug, error = %e, "modrinth lookup failed");
            None
        }
    }
}
