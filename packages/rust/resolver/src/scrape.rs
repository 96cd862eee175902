//! Best-effort project id extraction from CurseForge project pages.
//!
//! Project pages list the numeric id in the sidebar's details box as a
//! definition-list entry: `<dt>Project ID</dt><dd>238222</dd>`.

use std::sync::LazyLock;
use std::time::Duration;

use addonsync_shared::{ProjectId, Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, REFERER};
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, warn};

use crate::DeepResolver;

/// Desktop browser signature; project pages reject non-browser agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

const BROWSER_REFERER: &str = "https://www.google.com";

/// Maximum number of redirects to follow when fetching a project page.
const MAX_REDIRECTS: usize = 5;

/// Label of the definition-list entry holding the id.
const PROJECT_ID_LABEL: &str = "project id";

static DT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("dt selector"));

/// Fetches a record's CurseForge page and reads the project id off it.
pub struct PageScrapeResolver {
    client: Client,
}

impl PageScrapeResolver {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
        headers.insert(COOKIE, HeaderValue::from_static(""));

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `page_url` and extract the id.
    ///
    /// `Ok(None)` means the page loaded but carried no recognizable id.
    pub async fn fetch_project_id(&self, page_url: &str) -> Result<Option<ProjectId>> {
        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(|e| SyncError::Resolution(format!("{page_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Resolution(format!("{page_url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Resolution(format!("{page_url}: failed to read body: {e}")))?;

        Ok(extract_project_id(&body))
    }
}

#[async_trait]
impl DeepResolver for PageScrapeResolver {
    async fn resolve(&self, addon: &str, page_url: &str) -> Option<ProjectId> {
        info!(addon, url = page_url, "scraping project page for id");

        match self.fetch_project_id(page_url).await {
            Ok(Some(id)) => {
                info!(addon, %id, "extracted project id");
                Some(id)
            }
            Ok(None) => {
                warn!(addon, url = page_url, "could not extract project id from project page");
                None
            }
            Err(e) => {
                error!(addon, error = %e, "project page fetch failed");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "page-scrape"
    }
}

/// Find the `<dd>` following a `<dt>Project ID</dt>` and return its digits.
pub fn extract_project_id(html: &str) -> Option<ProjectId> {
    let doc = Html::parse_document(html);

    doc.select(&DT_SELECTOR)
        .filter(|dt| collapse_whitespace(dt).eq_ignore_ascii_case(PROJECT_ID_LABEL))
        .find_map(|dt| {
            let dd = dt.next_siblings().find_map(ElementRef::wrap)?;
            if dd.value().name() != "dd" {
                return None;
            }
            let text = dd.text().collect::<String>();
            let digits = text.trim();
            (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .then(|| ProjectId::new(digits))
        })
}

fn collapse_whitespace(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
