//! In-memory registry and resolver fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use addonsync_registry::{CurseforgeApi, ModrinthApi};
use addonsync_resolver::DeepResolver;
use addonsync_shared::{CurseforgeInfo, ModrinthInfo, ProjectId, Result, SyncError};
use async_trait::async_trait;

/// CurseForge fake serving a fixed set of ids.
#[derive(Default)]
pub struct FakeCurseforge {
    pub known: HashMap<String, CurseforgeInfo>,
    pub calls: AtomicUsize,
}

impl FakeCurseforge {
    pub fn with(ids: &[u64]) -> Self {
        let known = ids
            .iter()
            .map(|id| (id.to_string(), curseforge_info(*id)))
            .collect();
        Self {
            known,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CurseforgeApi for FakeCurseforge {
    async fn get_mod(&self, id: &ProjectId) -> Result<CurseforgeInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.known
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SyncError::registry("curseforge", "HTTP 404 Not Found"))
    }
}

/// Modrinth fake: every slug exists except `broken`. Slugs ending in a
/// number sleep that many milliseconds first.
#[derive(Default)]
pub struct FakeModrinth {
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    /// Highest number of lookups seen running at once.
    pub peak: AtomicUsize,
}

#[async_trait]
impl ModrinthApi for FakeModrinth {
    async fn get_project(&self, slug: &str) -> Result<ModrinthInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(ms) = slug.rsplit('-').next().and_then(|n| n.parse::<u64>().ok()) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if slug == "broken" {
            return Err(SyncError::registry("modrinth", "HTTP 500"));
        }
        let mut info = ModrinthInfo::new();
        info.insert("slug".into(), slug.into());
        info.insert("title".into(), slug.to_uppercase().into());
        Ok(info)
    }
}

/// Deep resolver that answers from a fixed map and counts its calls.
pub struct FakeDeep {
    answers: HashMap<String, ProjectId>,
    calls: Arc<AtomicUsize>,
}

impl FakeDeep {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, id)| (name.to_string(), ProjectId::new(*id)))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Call counter that outlives the boxed resolver.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DeepResolver for FakeDeep {
    async fn resolve(&self, addon: &str, _page_url: &str) -> Option<ProjectId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.get(addon).cloned()
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn curseforge_info(id: u64) -> CurseforgeInfo {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("Mod {id}"),
        "slug": format!("mod-{id}"),
        "summary": "a mod",
    }))
    .unwrap()
}
