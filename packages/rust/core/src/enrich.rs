//! Per-record enrichment and the bounded fan-out over a whole catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use addonsync_registry::{CurseforgeApi, ModrinthApi, lookup_curseforge, lookup_modrinth};
use addonsync_resolver::{ResolutionTier, Resolved, Resolver};
use addonsync_shared::{AddonRecord, CurseforgeInfo, ModrinthInfo};
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::pipeline::ProgressReporter;

/// A record after enrichment, with the tier its CurseForge id came from.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub record: AddonRecord,
    pub tier: Option<ResolutionTier>,
}

/// Enriches records against both registries.
pub struct Enricher {
    resolver: Resolver,
    curseforge: Arc<dyn CurseforgeApi>,
    modrinth: Arc<dyn ModrinthApi>,
    concurrency: usize,
}

impl Enricher {
    pub fn new(
        resolver: Resolver,
        curseforge: Arc<dyn CurseforgeApi>,
        modrinth: Arc<dyn ModrinthApi>,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            curseforge,
            modrinth,
            concurrency: concurrency.max(1),
        }
    }

    /// Enrich one record. Records without registry links are returned as is.
    ///
    /// The CurseForge branch (resolve, then fetch) and the Modrinth branch
    /// run concurrently; a failure in one never affects the other.
    pub async fn enrich_record(&self, mut record: AddonRecord) -> EnrichedRecord {
        if !record.has_references() {
            return EnrichedRecord { record, tier: None };
        }

        let ((resolved, curseforge_info), modrinth_info) = tokio::join!(
            self.curseforge_branch(&record),
            self.modrinth_branch(&record),
        );

        let tier = resolved.as_ref().map(|r| r.tier);
        if let Some(resolved) = resolved {
            record.curseforge_id = Some(resolved.id);
        }
        record.curseforge_info = curseforge_info;
        record.modrinth_info = modrinth_info;

        debug!(addon = %record.name, state = ?record.state(), ?tier, "record enriched");
        EnrichedRecord { record, tier }
    }

    /// Enrich every record with at most `concurrency` in flight.
    ///
    /// Output order matches input order regardless of completion order.
    pub async fn enrich_all(
        &self,
        records: Vec<AddonRecord>,
        progress: &dyn ProgressReporter,
    ) -> Vec<EnrichedRecord> {
        let total = records.len();
        let completed = AtomicUsize::new(0);
        let completed = &completed;

        stream::iter(records)
            .map(move |record| async move {
                let enriched = self.enrich_record(record).await;
                let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress.record_done(&enriched.record.name, current, total);
                enriched
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn curseforge_branch(
        &self,
        record: &AddonRecord,
    ) -> (Option<Resolved>, Option<CurseforgeInfo>) {
        let Some(resolved) = self.resolver.resolve(record).await else {
            return (None, None);
        };
        let info = lookup_curseforge(self.curseforge.as_ref(), &record.name, &resolved.id).await;
        (Some(resolved), info)
    }

    async fn modrinth_branch(&self, record: &AddonRecord) -> Option<ModrinthInfo> {
        let link = record.modrinth.as_deref()?;
        lookup_modrinth(self.modrinth.as_ref(), &record.name, link).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use addonsync_resolver::{DeepResolver, DisabledResolver};
    use addonsync_shared::{EnrichmentState, ProjectId};
    use addonsync_storage::IdentifierCache;

    use crate::pipeline::SilentProgress;
    use crate::testing::{FakeCurseforge, FakeDeep, FakeModrinth};

    fn record(name: &str, modrinth: Option<&str>, curseforge: Option<&str>) -> AddonRecord {
        AddonRecord {
            name: name.into(),
            category: "Mod".into(),
            description: String::new(),
            authors: String::new(),
            modrinth: modrinth.map(String::from),
            curseforge: curseforge.map(String::from),
            curseforge_id: None,
            website: None,
            curseforge_info: None,
            modrinth_info: None,
        }
    }

    struct Harness {
        enricher: Enricher,
        curseforge: Arc<FakeCurseforge>,
        modrinth: Arc<FakeModrinth>,
        cache: Arc<IdentifierCache>,
    }

    fn harness(known_ids: &[u64], deep: Box<dyn DeepResolver>, concurrency: usize) -> Harness {
        let cache = Arc::new(IdentifierCache::new());
        let curseforge = Arc::new(FakeCurseforge::with(known_ids));
        let modrinth = Arc::new(FakeModrinth::default());
        let enricher = Enricher::new(
            Resolver::new(Arc::clone(&cache), deep),
            curseforge.clone(),
            modrinth.clone(),
            concurrency,
        );
        Harness {
            enricher,
            curseforge,
            modrinth,
            cache,
        }
    }

    const CF_PAGE: &str = "https://www.curseforge.com/minecraft/mc-mods/bar";

    #[tokio::test]
    async fn modrinth_only_record_gets_modrinth_block() {
        let h = harness(&[], Box::new(DisabledResolver), 4);
        let out = h
            .enricher
            .enrich_record(record("Foo", Some("https://modrinth.com/mod/foo-bar"), None))
            .await;

        assert_eq!(out.record.modrinth_info.as_ref().unwrap()["slug"], "foo-bar");
        assert!(out.record.curseforge_info.is_none());
        assert!(out.record.curseforge_id.is_none());
        assert_eq!(out.tier, None);
        assert_eq!(out.record.state(), EnrichmentState::Enriched);
        assert_eq!(h.curseforge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_id_is_used_for_curseforge_fetch() {
        let h = harness(&[999], Box::new(DisabledResolver), 4);
        h.cache.insert("Bar", ProjectId::new("999")).await;

        let out = h.enricher.enrich_record(record("Bar", None, Some(CF_PAGE))).await;

        assert_eq!(out.record.curseforge_id, Some(ProjectId::new("999")));
        assert_eq!(out.record.curseforge_info.as_ref().unwrap().id, 999);
        assert_eq!(out.tier, Some(ResolutionTier::Cache));
        assert_eq!(h.modrinth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn records_without_links_touch_nothing() {
        let h = harness(&[1], Box::new(DisabledResolver), 4);
        let input = record("Baz", None, None);
        let out = h.enricher.enrich_record(input.clone()).await;

        assert_eq!(out.record, input);
        assert_eq!(out.record.state(), EnrichmentState::Unenriched);
        assert_eq!(h.curseforge.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.modrinth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_resolved_id_and_other_branch() {
        let deep = FakeDeep::new(&[("Both", "404")]);
        let h = harness(&[], Box::new(deep), 4);

        let out = h
            .enricher
            .enrich_record(record("Both", Some("https://modrinth.com/mod/both"), Some(CF_PAGE)))
            .await;

        assert_eq!(out.record.curseforge_id, Some(ProjectId::new("404")));
        assert!(out.record.curseforge_info.is_none());
        assert!(out.record.modrinth_info.is_some());
        assert_eq!(out.tier, Some(ResolutionTier::Deep));
        assert_eq!(out.record.state(), EnrichmentState::Partial);
    }

    #[tokio::test]
    async fn failed_modrinth_fetch_keeps_curseforge_block() {
        let h = harness(&[7], Box::new(DisabledResolver), 2);
        h.cache.insert("Bar", ProjectId::new("7")).await;

        let out = h
            .enricher
            .enrich_record(record("Bar", Some("https://modrinth.com/mod/broken"), Some(CF_PAGE)))
            .await;

        assert_eq!(out.record.curseforge_id, Some(ProjectId::new("7")));
        assert_eq!(out.record.curseforge_info.as_ref().unwrap().id, 7);
        assert!(out.record.modrinth_info.is_none());
        assert_eq!(out.record.state(), EnrichmentState::Partial);
        assert_eq!(h.modrinth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolvable_id_skips_curseforge_fetch() {
        let h = harness(&[1], Box::new(DisabledResolver), 4);
        let out = h
            .enricher
            .enrich_record(record("Bar", Some("https://modrinth.com/mod/broken"), Some(CF_PAGE)))
            .await;

        assert!(out.record.curseforge_id.is_none());
        assert!(out.record.modrinth_info.is_none());
        assert_eq!(out.record.state(), EnrichmentState::Partial);
        assert_eq!(h.curseforge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enrich_all_preserves_input_order() {
        let h = harness(&[], Box::new(DisabledResolver), 3);
        // Earlier records finish later.
        let records: Vec<_> = (0..6)
            .map(|i| {
                let link = format!("https://modrinth.com/mod/m-{}", (6 - i) * 15);
                record(&format!("R{i}"), Some(&link), None)
            })
            .collect();

        let out = h.enricher.enrich_all(records, &SilentProgress).await;

        let names: Vec<_> = out.iter().map(|e| e.record.name.as_str()).collect();
        assert_eq!(names, ["R0", "R1", "R2", "R3", "R4", "R5"]);
        assert!(out.iter().all(|e| e.record.modrinth_info.is_some()));
        assert_eq!(h.modrinth.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn records_in_flight_never_exceed_concurrency() {
        let h = harness(&[], Box::new(DisabledResolver), 3);
        let records: Vec<_> = (0..12)
            .map(|i| record(&format!("R{i}"), Some("https://modrinth.com/mod/slow-20"), None))
            .collect();

        let out = h.enricher.enrich_all(records, &SilentProgress).await;

        assert_eq!(out.len(), 12);
        let peak = h.modrinth.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in flight was {peak}");
        assert!(peak > 1, "records were enriched one at a time");
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped() {
        let h = harness(&[], Box::new(DisabledResolver), 0);
        let out = h
            .enricher
            .enrich_all(vec![record("A", None, None)], &SilentProgress)
            .await;
        assert_eq!(out.len(), 1);
    }
}
