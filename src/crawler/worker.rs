//! Crawl workers
//!
//! A worker repeatedly takes one entry from the frontier and runs it through
//! the gate, pacing, fetch, classification, extraction and link expansion.
//! Every failure is logged and confined to the entry that caused it.

use crate::classify::PageRole;
use crate::content_fingerprint;
use crate::control::ControlState;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry, InFlight};
use crate::crawler::parser::{extract_links, Extractor};
use crate::crawler::source::{Source, SourceRegistry};
use crate::crawler::writer::WriterMessage;
use crate::state::{CrawlCounters, DomainPacer};
use crate::storage::ArticleSnapshot;
use crate::url::domain_of;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

/// How long an idle worker sleeps before polling the frontier again
pub const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Everything the workers of one pass share
pub struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub sources: Arc<SourceRegistry>,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub control: ControlState,
    pub counters: Arc<CrawlCounters>,
    pub pacer: Arc<DomainPacer>,
    pub saves: mpsc::Sender<WriterMessage>,
    /// Discovery fetches admitted by the page-ceiling gate this run
    pub discovery_fetches: Arc<AtomicU64>,
    pub max_pages: u64,
    pub min_article_chars: usize,
    pub started: Instant,
}

/// Runs one worker until the frontier drains or the crawl stops
pub async fn run_worker(id: usize, ctx: Arc<WorkerContext>) {
    let cancel = ctx.control.cancelled();
    tracing::trace!(worker = id, "Worker started");

    loop {
        if ctx.control.is_stopped() {
            break;
        }
        if !ctx.control.wait_while_paused().await {
            break;
        }

        let entry = match ctx.frontier.next() {
            Some(entry) => entry,
            None => {
                if ctx.frontier.is_drained() {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(IDLE_WAIT) => {}
                }
                continue;
            }
        };

        let _in_flight = InFlight::new(&ctx.frontier);
        process_entry(&ctx, entry).await;
    }

    tracing::trace!(worker = id, "Worker finished");
}

/// Processes one frontier entry end to end
async fn process_entry(ctx: &WorkerContext, entry: FrontierEntry) {
    let url = entry.url.as_str();
    let Some(source) = ctx.sources.get(entry.source) else {
        tracing::warn!(url = %url, source = %entry.source, "Entry references an unknown source");
        return;
    };

    if let Err(rejection) = source.guard.check(url) {
        tracing::debug!(url = %url, reason = %rejection, "Skipping URL");
        return;
    }

    if !entry.is_recrawl && !admit_discovery_fetch(ctx) {
        tracing::debug!(url = %url, "Page ceiling reached; not fetching");
        return;
    }

    let Some(page) = polite_fetch(ctx, source, url).await else {
        return;
    };

    let fetched = ctx.counters.record_fetch();
    if fetched % 10 == 0 {
        let elapsed = ctx.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { fetched as f64 / elapsed } else { 0.0 };
        tracing::info!(
            "Progress: {} pages fetched, {} pending, {:.2} pages/sec",
            fetched,
            ctx.frontier.pending(),
            rate
        );
    }

    let role = source.classify(url);
    match role {
        PageRole::Unknown => {
            tracing::debug!(url = %url, "Unknown page; discarding");
            return;
        }
        PageRole::Article => {
            if !save_article(ctx, source, &entry, &page).await {
                return;
            }
        }
        PageRole::Hub => {}
    }

    if !entry.is_recrawl && (role == PageRole::Hub || source.expand_articles) {
        enqueue_links(ctx, source, &entry, &page);
    }
}

/// Reserves a discovery fetch under the page ceiling
fn admit_discovery_fetch(ctx: &WorkerContext) -> bool {
    ctx.discovery_fetches
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            (n < ctx.max_pages).then_some(n + 1)
        })
        .is_ok()
}

/// Waits for the domain's slot and permit, then fetches
///
/// A pause that lands while waiting gives the slot and permit back; the
/// worker reserves a fresh slot once resumed, so resumed workers stay spaced
/// by the domain interval.
///
/// Returns `None` when the crawl stops before the fetch starts or the fetch
/// fails.
async fn polite_fetch(ctx: &WorkerContext, source: &Source, url: &str) -> Option<FetchedPage> {
    let cancel = ctx.control.cancelled();
    let domain = domain_of(url).unwrap_or_default();

    let _permit = loop {
        if !ctx.control.wait_while_paused().await {
            return None;
        }

        let reservation = ctx.pacer.reserve(&domain, source.guard.crawl_delay());
        if !reservation.wait.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(reservation.wait) => {}
            }
        }

        let permit = tokio::select! {
            _ = cancel.cancelled() => return None,
            permit = reservation.permits.acquire_owned() => permit.ok()?,
        };

        if !ctx.control.is_paused() {
            break permit;
        }
        tracing::debug!(url = %url, "Paused before fetch; releasing domain slot");
    };

    tracing::debug!(url = %url, "Fetching");
    match ctx.fetcher.fetch(url).await {
        Ok(page) => Some(page),
        Err(e) => {
            ctx.counters.record_fetch_failure();
            tracing::warn!(url = %url, error = %e, "Fetch failed");
            None
        }
    }
}

/// Extracts an article and queues it for persistence
///
/// Returns `false` when extraction failed, in which case links are not
/// followed from the page either.
async fn save_article(
    ctx: &WorkerContext,
    source: &Source,
    entry: &FrontierEntry,
    page: &FetchedPage,
) -> bool {
    let url = entry.url.as_str();
    let article = match ctx.extractor.extract(&page.body, &page.final_url) {
        Ok(article) => article,
        Err(e) => {
            ctx.counters.record_extract_failure();
            tracing::warn!(url = %url, error = %e, "Extraction failed");
            return false;
        }
    };

    let length = article.text.chars().count();
    if length < ctx.min_article_chars {
        tracing::debug!(url = %url, chars = length, "Article too short; not saving");
        return true;
    }

    let snapshot = ArticleSnapshot {
        url: page.final_url.clone(),
        normalized_url: url.to_string(),
        source: source.name.clone(),
        title: article.title,
        content_hash: content_fingerprint(&article.html),
        html: article.html,
        text: article.text,
        excerpt: article.excerpt,
        status_code: page.status,
        fetched_at: Utc::now(),
    };

    if ctx.saves.send(WriterMessage::Save(snapshot)).await.is_err() {
        ctx.counters.record_save_failure();
        tracing::error!(url = %url, "Save queue closed; article dropped");
    }
    true
}

/// Submits a page's outbound links to the frontier at depth + 1
fn enqueue_links(ctx: &WorkerContext, source: &Source, entry: &FrontierEntry, page: &FetchedPage) {
    let base = Url::parse(&page.final_url).or_else(|_| Url::parse(entry.url.as_str()));
    let Ok(base) = base else {
        return;
    };

    let mut added = 0usize;
    for link in extract_links(&page.body, &base) {
        let Some(target) = ctx
            .sources
            .resolve(&link, Some(source.id))
            .and_then(|id| ctx.sources.get(id))
        else {
            continue;
        };
        if !target.guard.allows(&link) || target.classify(&link) == PageRole::Unknown {
            continue;
        }
        if ctx.frontier.add(&link, target.id, entry.depth + 1, false) {
            added += 1;
        }
    }

    if added > 0 {
        tracing::debug!(url = %entry.url, links = added, depth = entry.depth + 1, "Enqueued links");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierConfig, DatedArticleConfig, SourceConfig};
    use crate::crawler::fetcher::FetchError;
    use crate::crawler::parser::MainContentExtractor;
    use crate::crawler::source::SourceId;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingFetcher {
        requests: Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for RecordingFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(FetchedPage {
                final_url: url.to_string(),
                status: 200,
                body: "<html><body><p>hub</p></body></html>".to_string(),
            })
        }
    }

    fn create_test_context(
        fetcher: Arc<RecordingFetcher>,
        delay: Duration,
        max_pages: u64,
    ) -> (Arc<WorkerContext>, mpsc::Receiver<WriterMessage>) {
        let config = SourceConfig {
            name: "news".to_string(),
            domains: vec!["example.com".to_string()],
            seeds: vec![],
            follow_patterns: vec![],
            exclude_patterns: vec!["^/blocked".to_string()],
            expand_articles: true,
            classifier: ClassifierConfig::DatedArticle(DatedArticleConfig::default()),
        };
        let mut sources = SourceRegistry::new();
        sources
            .register(|id| Source::from_config(id, &config, None, "TestBot"))
            .unwrap();

        let (saves, rx) = mpsc::channel(8);
        let ctx = WorkerContext {
            frontier: Arc::new(Frontier::new(100, 2)),
            sources: Arc::new(sources),
            fetcher,
            extractor: Arc::new(MainContentExtractor::new()),
            control: ControlState::new(),
            counters: Arc::new(CrawlCounters::new()),
            pacer: Arc::new(DomainPacer::new(delay, 2)),
            saves,
            discovery_fetches: Arc::new(AtomicU64::new(0)),
            max_pages,
            min_article_chars: 0,
            started: Instant::now(),
        };
        (Arc::new(ctx), rx)
    }

    fn take_entry(ctx: &WorkerContext, url: &str) -> FrontierEntry {
        assert!(ctx.frontier.add(url, SourceId(0), 0, false));
        ctx.frontier.next().unwrap()
    }

    #[tokio::test]
    async fn test_rejected_url_does_not_spend_page_budget() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (ctx, _rx) = create_test_context(fetcher.clone(), Duration::ZERO, 1);

        let blocked = take_entry(&ctx, "https://example.com/blocked");
        process_entry(&ctx, blocked).await;
        ctx.frontier.finish();
        assert_eq!(ctx.discovery_fetches.load(Ordering::SeqCst), 0);

        let hub = take_entry(&ctx, "https://example.com/sport");
        process_entry(&ctx, hub).await;
        ctx.frontier.finish();

        assert_eq!(fetcher.requests(), vec!["https://example.com/sport".to_string()]);
        assert_eq!(ctx.discovery_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pause_during_slot_wait_reserves_again() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let (ctx, _rx) = create_test_context(fetcher.clone(), Duration::from_millis(200), 10);

        // Occupy the current slot so the fetch below has to wait for the next one
        ctx.pacer.reserve("example.com", None);

        let task = tokio::spawn({
            let ctx = Arc::clone(&ctx);
            async move {
                let source = ctx.sources.get(SourceId(0)).unwrap();
                polite_fetch(&ctx, source, "https://example.com/sport").await
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ctx.control.pause());
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(fetcher.requests().is_empty());
        assert_eq!(ctx.pacer.request_count("example.com"), 2);

        assert!(ctx.control.resume());
        let page = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("fetch did not resume")
            .unwrap();

        assert!(page.is_some());
        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(ctx.pacer.request_count("example.com"), 3);
    }
}
