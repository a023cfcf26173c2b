use crate::storage::WriteKind;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-wide counters for one crawl run
///
/// Shared by every worker and the writer task. Persistence counters are only
/// incremented after the store confirms the write.
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_fetched: AtomicU64,
    created: AtomicU64,
    modified: AtomicU64,
    unchanged: AtomicU64,
    fetch_failures: AtomicU64,
    extract_failures: AtomicU64,
    save_failures: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed fetch and returns the new total
    pub fn record_fetch(&self) -> u64 {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extract_failure(&self) {
        self.extract_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, kind: WriteKind) {
        let counter = match kind {
            WriteKind::Created => &self.created,
            WriteKind::Modified => &self.modified,
            WriteKind::Unchanged => &self.unchanged,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::SeqCst)
    }

    pub fn articles_saved(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
            + self.modified.load(Ordering::Relaxed)
            + self.unchanged.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time report
    pub fn snapshot(&self, elapsed: Duration) -> RunReport {
        RunReport {
            pages_fetched: self.pages_fetched(),
            created: self.created.load(Ordering::Relaxed),
            modified: self.modified.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            extract_failures: self.extract_failures.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            elapsed,
            stopped: false,
        }
    }
}

/// Summary of a finished (or stopped) crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub pages_fetched: u64,
    pub created: u64,
    pub modified: u64,
    pub unchanged: u64,
    pub fetch_failures: u64,
    pub extract_failures: u64,
    pub save_failures: u64,
    pub elapsed: Duration,
    /// Whether the run ended on an operator stop
    pub stopped: bool,
}

impl RunReport {
    pub fn articles_saved(&self) -> u64 {
        self.created + self.modified + self.unchanged
    }

    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_fetched as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scraped Pages: {} | Articles Saved: {}",
            self.pages_fetched,
            self.articles_saved()
        )
    }
}
