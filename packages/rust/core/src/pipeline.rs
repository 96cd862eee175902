//! End-to-end `sync` pipeline: table → resolve → enrich → document + table + cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use addonsync_registry::{CurseforgeApi, CurseforgeClient, ModrinthApi, ModrinthClient};
use addonsync_resolver::{
    DeepResolver, DisabledResolver, PageScrapeResolver, ResolutionTier, Resolver,
};
use addonsync_shared::{AddonRecord, EnrichmentState, Result, SourceRow, SyncConfig};
use addonsync_storage::{cache, emit_document, read_rows, rewrite_ids};
use tracing::{info, instrument, warn};

use crate::enrich::{EnrichedRecord, Enricher};

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records read from the source table.
    pub records: usize,
    /// Records where every referenced registry produced a block.
    pub enriched: usize,
    /// Records where at least one referenced registry produced nothing.
    pub partial: usize,
    /// Records with no registry links.
    pub unenriched: usize,
    /// Ids taken from the cache.
    pub ids_from_cache: usize,
    /// Ids found by deep resolution this run.
    pub ids_scraped: usize,
    /// Table rows that got a `Curseforge ID` written back.
    pub ids_written: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called each time a record finishes enrichment.
    fn record_done(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &SyncReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_done(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &SyncReport) {}
}

/// Run a sync against the live registries.
///
/// Builds the HTTP clients from `config` and hands off to [`sync_with`].
/// `api_key` is the CurseForge credential.
pub async fn run_sync(
    config: &SyncConfig,
    api_key: &str,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport> {
    config.validate()?;

    let deep: Box<dyn DeepResolver> = if config.deep_resolution {
        Box::new(PageScrapeResolver::new(config.http_timeout_secs)?)
    } else {
        Box::new(DisabledResolver)
    };
    let curseforge = Arc::new(CurseforgeClient::new(
        &config.curseforge_api_base,
        api_key,
        config.http_timeout_secs,
    )?);
    let modrinth = Arc::new(ModrinthClient::new(
        &config.modrinth_api_base,
        config.http_timeout_secs,
    )?);

    sync_with(config, deep, curseforge, modrinth, progress).await
}

/// Run a sync with caller-supplied resolver and registry clients.
///
/// 1. Load the id cache
/// 2. Read and project the source table
/// 3. Enrich every record
/// 4. Write the document
/// 5. Rewrite ids into the source table
/// 6. Flush the id cache
#[instrument(skip_all, fields(source = %config.source_path.display()))]
pub async fn sync_with(
    config: &SyncConfig,
    deep: Box<dyn DeepResolver>,
    curseforge: Arc<dyn CurseforgeApi>,
    modrinth: Arc<dyn ModrinthApi>,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport> {
    let start = Instant::now();
    info!(deep = deep.name(), concurrency = config.concurrency, "starting sync");

    // --- Phase 1: Cache ---
    progress.phase("Loading id cache");
    let id_cache = Arc::new(cache::load(&config.id_cache_path).await?);

    // --- Phase 2: Source table ---
    progress.phase("Reading source table");
    let rows = read_rows(&config.source_path).await?;
    let records = project_records(&rows);

    // --- Phase 3: Enrichment ---
    progress.phase("Enriching records");
    let enricher = Enricher::new(
        Resolver::new(Arc::clone(&id_cache), deep),
        curseforge,
        modrinth,
        config.concurrency,
    );
    let enriched = enricher.enrich_all(records, progress).await;

    let mut report = tally(&enriched);
    let records: Vec<AddonRecord> = enriched.into_iter().map(|e| e.record).collect();

    // --- Phase 4: Outputs ---
    progress.phase("Writing document");
    emit_document(&config.document_path, &records).await?;

    progress.phase("Rewriting source table");
    let rewrite = rewrite_ids(&config.source_path, &records).await?;
    report.ids_written = rewrite.substituted;

    progress.phase("Saving id cache");
    cache::flush(&config.id_cache_path, &id_cache).await?;

    report.elapsed = start.elapsed();
    progress.done(&report);

    info!(
        records = report.records,
        enriched = report.enriched,
        partial = report.partial,
        unenriched = report.unenriched,
        ids_from_cache = report.ids_from_cache,
        ids_scraped = report.ids_scraped,
        elapsed_ms = report.elapsed.as_millis(),
        "sync complete"
    );

    Ok(report)
}

/// Project source rows onto records, warning about names that cannot act
/// as a join key.
fn project_records(rows: &[SourceRow]) -> Vec<AddonRecord> {
    let mut seen = HashSet::with_capacity(rows.len());

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let record = AddonRecord::from_row(row);
            if record.name.trim().is_empty() {
                warn!(row = i + 1, "source row has an empty name");
            } else if !seen.insert(record.name.clone()) {
                warn!(addon = %record.name, "duplicate name in source table; cache and table rewrite use the first");
            }
            record
        })
        .collect()
}

fn tally(enriched: &[EnrichedRecord]) -> SyncReport {
    let mut report = SyncReport {
        records: enriched.len(),
        ..SyncReport::default()
    };

    for e in enriched {
        match e.record.state() {
            EnrichmentState::Enriched => report.enriched += 1,
            EnrichmentState::Partial => report.partial += 1,
            EnrichmentState::Unenriched => report.unenriched += 1,
        }
        match e.tier {
            Some(ResolutionTier::Cache) => report.ids_from_cache += 1,
            Some(ResolutionTier::Deep) => report.ids_scraped += 1,
            Some(ResolutionTier::Explicit) | None => {}
        }
    }

    report
}
