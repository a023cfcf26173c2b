//! URL frontier: the seen-set and FIFO work queue of one crawl pass
//!
//! The frontier is the only deduplication mechanism of the crawler. A
//! normalized key is accepted at most once per frontier and the seen-set
//! never shrinks. The lock is held only for the membership check and queue
//! operation, never across I/O.

use crate::crawler::source::SourceId;
use crate::url::{normalize_for_dedup, NormalizedUrl};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// A URL scheduled for fetching
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: NormalizedUrl,
    pub source: SourceId,
    /// Link distance from the seeds (recrawl entries use 0)
    pub depth: u32,
    pub is_recrawl: bool,
    pub enqueued_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<NormalizedUrl>,
    queue: VecDeque<FrontierEntry>,
    /// Entries handed out and not yet finished
    in_flight: usize,
    /// Discovery entries accepted so far
    discovered: usize,
}

/// Thread-safe frontier with depth and page ceilings
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<Inner>,
    max_pages: usize,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_pages` - Maximum number of discovery entries ever accepted
    /// * `max_depth` - Entries deeper than this are rejected
    pub fn new(max_pages: usize, max_depth: u32) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_pages,
            max_depth,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Normalizes and enqueues a URL unless its key was already seen
    ///
    /// Recrawl entries are exempt from the page ceiling.
    ///
    /// # Returns
    ///
    /// `true` if the entry was enqueued; `false` leaves the frontier untouched
    pub fn add(&self, url: &str, source: SourceId, depth: u32, is_recrawl: bool) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let key = normalize_for_dedup(url);

        let mut inner = self.lock();
        if !is_recrawl && inner.discovered >= self.max_pages {
            return false;
        }
        if !inner.seen.insert(key.clone()) {
            return false;
        }
        if !is_recrawl {
            inner.discovered += 1;
        }
        inner.queue.push_back(FrontierEntry {
            url: key,
            source,
            depth,
            is_recrawl,
            enqueued_at: Instant::now(),
        });
        true
    }

    /// Dequeues the oldest pending entry
    ///
    /// The caller must call [`Frontier::finish`] once the entry is processed.
    pub fn next(&self) -> Option<FrontierEntry> {
        let mut inner = self.lock();
        let entry = inner.queue.pop_front()?;
        inner.in_flight += 1;
        Some(entry)
    }

    /// Marks a dequeued entry as processed
    pub fn finish(&self) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    /// True when nothing is queued and nothing is being processed
    ///
    /// A drained frontier can no longer grow on its own, so workers may exit.
    pub fn is_drained(&self) -> bool {
        let inner = self.lock();
        inner.queue.is_empty() && inner.in_flight == 0
    }

    /// Number of distinct normalized keys accepted so far
    pub fn size(&self) -> usize {
        self.lock().seen.len()
    }

    /// Number of entries waiting to be fetched
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().seen.contains(&normalize_for_dedup(url))
    }
}

/// Finishes a frontier entry when dropped
pub struct InFlight<'a> {
    frontier: &'a Frontier,
}

impl<'a> InFlight<'a> {
    pub fn new(frontier: &'a Frontier) -> Self {
        Self { frontier }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.frontier.finish();
    }
}
