use addonsync_shared::{ModrinthInfo, Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::{ModrinthApi, build_client};

const REGISTRY: &str = "modrinth";

/// Fields dropped from Modrinth project payloads: long-form text, version
/// lists, and other data that churns between runs.
pub const STRIPPED_FIELDS: &[&str] = &[
    "body",
    "body_url",
    "project_type",
    "categories",
    "additional_categories",
    "versions",
    "thread_id",
    "monetization_status",
];

/// Client for `GET {api_base}/v2/project/{slug}`.
pub struct ModrinthClient {
    client: Client,
    api_base: String,
}

impl ModrinthClient {
    pub fn new(api_base: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(REGISTRY, timeout_secs)?,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModrinthApi for ModrinthClient {
    #[instrument(skip_all, fields(slug = %slug))]
    async fn get_project(&self, slug: &str) -> Result<ModrinthInfo> {
        let url = format!("{}/v2/project/{slug}", self.api_base);
        debug!(%url, "requesting modrinth project");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::registry(REGISTRY, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::registry(REGISTRY, format!("{url}: HTTP {status}")));
        }

        let mut project: ModrinthInfo = response
            .json()
            .await
            .map_err(|e| SyncError::registry(REGISTRY, format!("{url}: invalid body: {e}")))?;

        strip_volatile_fields(&mut project);
        Ok(project)
    }
}

/// Remove every key in [`STRIPPED_FIELDS`] from `project`.
pub fn strip_volatile_fields(project: &mut ModrinthInfo) {
    for field in STRIPPED_FIELDS {
        project.remove(*field);
    }
}

/// The project slug: last non-empty path segment of a Modrinth link.
///
/// `https://modrinth.com/mod/sodium/` and `https://modrinth.com/mod/sodium?x=1`
/// both yield `sodium`. Links without a scheme (`modrinth.com/mod/sodium`,
/// `/mod/sodium`, a bare `sodium`) are split on `/` after dropping any query
/// or fragment.
pub fn slug_from_link(link: &str) -> Option<String> {
    let link = link.trim();
    if let Ok(url) = Url::parse(link) {
        return url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(String::from);
    }

    let path = link.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()
        .map(String::from)
}
