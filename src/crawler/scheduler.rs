//! Phase controller and worker pool
//!
//! A run has two strictly ordered phases:
//! - **Recrawl**: stale stored documents are fetched again, in bounded batches
//! - **Discovery**: seeds are crawled and links followed up to the ceilings
//!
//! Each batch or phase runs a pool of workers over a shared frontier and
//! waits for all of them before moving on, so no Discovery fetch starts while
//! Recrawl work is in flight. A stop issued during Recrawl skips Discovery.

use crate::config::{Config, RecrawlConfig};
use crate::control::ControlState;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{Extractor, MainContentExtractor};
use crate::crawler::source::SourceRegistry;
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::crawler::writer::{flush, save_queue, spawn_writer, WriterMessage};
use crate::state::{CrawlCounters, DomainPacer, RunReport};
use crate::storage::{SharedStore, StaleCursor, StorageResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Recrawl,
    Discovery,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlPhase::Recrawl => f.write_str("recrawl"),
            CrawlPhase::Discovery => f.write_str("discovery"),
        }
    }
}

/// Tunables of the scheduler, taken from configuration
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub workers: usize,
    pub max_depth: u32,
    pub max_pages: usize,
    pub min_article_chars: usize,
    /// Minimum interval between requests to one domain
    pub delay: Duration,
    pub max_domain_concurrency: usize,
    pub save_queue_capacity: usize,
    pub recrawl: RecrawlConfig,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.crawler.workers,
            max_depth: config.crawler.max_depth,
            max_pages: config.crawler.max_pages,
            min_article_chars: config.crawler.min_article_chars,
            delay: Duration::from_millis(config.crawler.delay_ms),
            max_domain_concurrency: config.crawler.max_domain_concurrency,
            save_queue_capacity: config.output.save_queue_capacity,
            recrawl: config.recrawl.clone(),
        }
    }
}

/// Drives one crawl run over a set of sources
pub struct Crawler {
    settings: CrawlSettings,
    sources: Arc<SourceRegistry>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    store: SharedStore,
    control: ControlState,
    counters: Arc<CrawlCounters>,
    pacer: Arc<DomainPacer>,
    frontier: Arc<Frontier>,
    discovery_fetches: Arc<AtomicU64>,
}

impl Crawler {
    /// Creates a crawler using the default [`MainContentExtractor`]
    pub fn new(
        settings: CrawlSettings,
        sources: SourceRegistry,
        fetcher: Arc<dyn Fetcher>,
        store: SharedStore,
        control: ControlState,
    ) -> Self {
        let pacer = DomainPacer::new(settings.delay, settings.max_domain_concurrency);
        let frontier = Frontier::new(settings.max_pages, settings.max_depth);

        Self {
            settings,
            sources: Arc::new(sources),
            fetcher,
            extractor: Arc::new(MainContentExtractor::new()),
            store,
            control,
            counters: Arc::new(CrawlCounters::new()),
            pacer: Arc::new(pacer),
            frontier: Arc::new(frontier),
            discovery_fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// The frontier of the main run
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn counters(&self) -> &CrawlCounters {
        &self.counters
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Runs Recrawl then Discovery and drains the save queue
    ///
    /// Always returns a report, including when the run was stopped.
    pub async fn run(&self) -> RunReport {
        let started = Instant::now();
        let (tx, rx) = save_queue(self.settings.save_queue_capacity);
        let writer = spawn_writer(Arc::clone(&self.store), rx, Arc::clone(&self.counters));

        tracing::info!(phase = %CrawlPhase::Recrawl, "Starting phase");
        self.recrawl_pass(&self.frontier, &tx, &self.counters, started)
            .await;

        if self.control.is_stopped() {
            tracing::info!("Stopped during recrawl; discovery skipped");
        } else {
            tracing::info!(phase = %CrawlPhase::Discovery, "Starting phase");
            let seeded = self.seed();
            tracing::info!(seeds = seeded, sources = self.sources.len(), "Seeded frontier");
            self.run_pass(&self.frontier, &tx, &self.counters, started)
                .await;
        }

        self.finish(tx, writer, &self.counters, started).await
    }

    /// Runs a standalone Recrawl pass with its own frontier and writer
    ///
    /// Used by long-running deployments between full runs.
    pub async fn recrawl_cycle(&self) -> RunReport {
        let started = Instant::now();
        let frontier = Arc::new(Frontier::new(self.settings.max_pages, self.settings.max_depth));
        let counters = Arc::new(CrawlCounters::new());
        let (tx, rx) = save_queue(self.settings.save_queue_capacity);
        let writer = spawn_writer(Arc::clone(&self.store), rx, Arc::clone(&counters));

        self.recrawl_pass(&frontier, &tx, &counters, started).await;

        self.finish(tx, writer, &counters, started).await
    }

    async fn finish(
        &self,
        tx: mpsc::Sender<WriterMessage>,
        writer: tokio::task::JoinHandle<()>,
        counters: &CrawlCounters,
        started: Instant,
    ) -> RunReport {
        drop(tx);
        if let Err(e) = writer.await {
            tracing::error!(error = %e, "Writer task failed");
        }

        let mut report = counters.snapshot(started.elapsed());
        report.stopped = self.control.is_stopped();
        tracing::info!(
            created = report.created,
            modified = report.modified,
            unchanged = report.unchanged,
            fetch_failures = report.fetch_failures,
            stopped = report.stopped,
            "{}",
            report
        );
        report
    }

    /// Seeds every source's seed URLs at depth 0
    fn seed(&self) -> usize {
        self.sources
            .iter()
            .flat_map(|source| source.seeds.iter().map(move |seed| (source.id, seed)))
            .filter(|(id, seed)| self.frontier.add(seed, *id, 0, false))
            .count()
    }

    /// Fetches stale documents in batches until the stale set is exhausted
    ///
    /// The cutoff is fixed when the pass starts. Batches are paged by a
    /// `(last_scraped, normalized_url)` cursor until a page comes back empty.
    async fn recrawl_pass(
        &self,
        frontier: &Arc<Frontier>,
        saves: &mpsc::Sender<WriterMessage>,
        counters: &Arc<CrawlCounters>,
        started: Instant,
    ) {
        if !self.settings.recrawl.enabled {
            tracing::debug!("Recrawl disabled");
            return;
        }

        let cutoff =
            Utc::now() - chrono::Duration::hours(i64::from(self.settings.recrawl.threshold_hours));
        let mut cursor: Option<StaleCursor> = None;
        let mut batches = 0usize;
        loop {
            if self.control.is_stopped() {
                break;
            }
            if !flush(saves).await {
                break;
            }

            let batch = match self.stale_batch(cutoff, cursor.as_ref()) {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load stale documents");
                    break;
                }
            };
            let Some(last) = batch.last().cloned() else {
                break;
            };
            cursor = Some(last);

            let mut added = 0usize;
            for entry in &batch {
                let url = entry.normalized_url.as_str();
                match self.sources.resolve(url, None) {
                    Some(id) => {
                        if frontier.add(url, id, 0, true) {
                            added += 1;
                        }
                    }
                    None => tracing::debug!(url = %url, "No source covers stale document"),
                }
            }
            if added == 0 {
                continue;
            }

            batches += 1;
            tracing::info!(batch = batches, urls = added, "Recrawling stale documents");
            self.run_pass(frontier, saves, counters, started).await;
        }

        tracing::info!(batches, "Recrawl phase complete");
    }

    fn stale_batch(
        &self,
        cutoff: DateTime<Utc>,
        after: Option<&StaleCursor>,
    ) -> StorageResult<Vec<StaleCursor>> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.stale_page(cutoff, after, self.settings.recrawl.batch_size)
    }

    /// Runs the worker pool until the frontier drains or the crawl stops
    async fn run_pass(
        &self,
        frontier: &Arc<Frontier>,
        saves: &mpsc::Sender<WriterMessage>,
        counters: &Arc<CrawlCounters>,
        started: Instant,
    ) {
        let ctx = Arc::new(WorkerContext {
            frontier: Arc::clone(frontier),
            sources: Arc::clone(&self.sources),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            control: self.control.clone(),
            counters: Arc::clone(counters),
            pacer: Arc::clone(&self.pacer),
            saves: saves.clone(),
            discovery_fetches: Arc::clone(&self.discovery_fetches),
            max_pages: self.settings.max_pages as u64,
            min_article_chars: self.settings.min_article_chars,
            started,
        });

        let mut workers = JoinSet::new();
        for id in 0..self.settings.workers.max(1) {
            workers.spawn(run_worker(id, Arc::clone(&ctx)));
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker task failed");
            }
        }
    }
}
