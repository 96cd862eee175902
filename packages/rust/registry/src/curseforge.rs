use addonsync_shared::{CurseforgeInfo, ProjectId, Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{CurseforgeApi, build_client};

const REGISTRY: &str = "curseforge";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Every CurseForge response body is wrapped in `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Client for `GET {api_base}/v1/mods/{id}`.
pub struct CurseforgeClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl CurseforgeClient {
    pub fn new(api_base: &str, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(REGISTRY, timeout_secs)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl CurseforgeApi for CurseforgeClient {
    #[instrument(skip_all, fields(id = %id))]
    async fn get_mod(&self, id: &ProjectId) -> Result<CurseforgeInfo> {
        let url = format!("{}/v1/mods/{id}", self.api_base);
        debug!(%url, "requesting curseforge mod");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SyncError::registry(REGISTRY, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::registry(REGISTRY, format!("{url}: HTTP {status}")));
        }

        let envelope: Envelope<CurseforgeInfo> = response
            .json()
            .await
            .map_err(|e| SyncError::registry(REGISTRY, format!("{url}: invalid body: {e}")))?;

        Ok(envelope.data)
    }
}
