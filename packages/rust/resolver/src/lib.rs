//! CurseForge project id resolution.
//!
//! A record's id is resolved in three tiers, first hit wins:
//! 1. the id already present in the source table,
//! 2. the persistent [`IdentifierCache`], keyed by addon name,
//! 3. a [`DeepResolver`], which is [`DisabledResolver`] unless page
//!    scraping was opted into, in which case it is [`PageScrapeResolver`].
//!
//! Tier 3 hits are written back into the cache so the next run resolves
//! them at tier 2 without touching the network.

mod scrape;

use std::sync::Arc;

use addonsync_shared::{AddonRecord, ProjectId};
use addonsync_storage::IdentifierCache;
use async_trait::async_trait;
use tracing::debug;

pub use scrape::{PageScrapeResolver, extract_project_id};

// ---------------------------------------------------------------------------
// Deep resolution strategies
// ---------------------------------------------------------------------------

/// Last-resort id lookup for records the table and cache know nothing about.
///
/// Implementations never fail outward: errors are logged against `addon`
/// and reported as `None`.
#[async_trait]
pub trait DeepResolver: Send + Sync {
    async fn resolve(&self, addon: &str, page_url: &str) -> Option<ProjectId>;

    /// Strategy name for tracing.
    fn name(&self) -> &str;
}

/// Deep resolution turned off; only the table and cache are trusted.
pub struct DisabledResolver;

#[async_trait]
impl DeepResolver for DisabledResolver {
    async fn resolve(&self, addon: &str, _page_url: &str) -> Option<ProjectId> {
        debug!(addon, "no known project id and deep resolution is disabled");
        None
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Which tier produced an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Explicit,
    Cache,
    Deep,
}

/// A resolved id and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub id: ProjectId,
    pub tier: ResolutionTier,
}

/// Tiered id resolver over a shared cache handle.
pub struct Resolver {
    cache: Arc<IdentifierCache>,
    deep: Box<dyn DeepResolver>,
}

impl Resolver {
    pub fn new(cache: Arc<IdentifierCache>, deep: Box<dyn DeepResolver>) -> Self {
        Self { cache, deep }
    }

    pub fn cache(&self) -> &IdentifierCache {
        &self.cache
    }

    /// Resolve the CurseForge id for `record`.
    ///
    /// Returns `None` when the record has no CurseForge link or no tier
    /// produced an id.
    pub async fn resolve(&self, record: &AddonRecord) -> Option<Resolved> {
        let page_url = record.curseforge.as_deref()?;

        if let Some(id) = &record.curseforge_id {
            return Some(Resolved {
                id: id.clone(),
                tier: ResolutionTier::Explicit,
            });
        }

        if let Some(id) = self.cache.get(&record.name).await {
            debug!(addon = %record.name, %id, "project id found in cache");
            return Some(Resolved {
                id,
                tier: ResolutionTier::Cache,
            });
        }

        debug!(addon = %record.name, strategy = self.deep.name(), "trying deep resolution");
        let id = self.deep.resolve(&record.name, page_url).await?;
        self.cache.insert(&record.name, id.clone()).await;

        Some(Resolved {
            id,
            tier: ResolutionTier::Deep,
        })
    }
}
