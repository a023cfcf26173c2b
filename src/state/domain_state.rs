use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Tracks the pacing state of one domain during a crawl
#[derive(Debug)]
pub struct DomainState {
    /// Number of request slots handed out for this domain
    pub request_count: u64,

    /// Earliest instant the next request may start
    pub next_slot: Option<Instant>,

    /// Limits simultaneous fetches against this domain
    permits: Arc<Semaphore>,
}

impl DomainState {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            request_count: 0,
            next_slot: None,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// Slots are spaced `interval` apart, so concurrent callers queue up
    /// behind each other instead of all firing once the delay elapses.
    pub fn reserve(&mut self, interval: Duration, now: Instant) -> Duration {
        let start = match self.next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        self.next_slot = Some(start + interval);
        self.request_count += 1;
        start - now
    }

    pub fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }
}

/// A reserved request slot for a domain
#[derive(Debug)]
pub struct Reservation {
    /// Time to wait before the request may start
    pub wait: Duration,
    /// Semaphore to acquire for the duration of the fetch
    pub permits: Arc<Semaphore>,
}

/// Per-domain politeness pacing shared by all workers
///
/// The effective interval for a domain is the larger of the configured
/// minimum delay and the robots.txt Crawl-delay.
#[derive(Debug)]
pub struct DomainPacer {
    min_interval: Duration,
    max_concurrency: usize,
    domains: Mutex<HashMap<String, DomainState>>,
}

impl DomainPacer {
    pub fn new(min_interval: Duration, max_concurrency: usize) -> Self {
        Self {
            min_interval,
            max_concurrency,
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Reserves the next request slot for a domain
    ///
    /// # Arguments
    ///
    /// * `domain` - The lowercase host
    /// * `crawl_delay` - Crawl-delay requested by robots.txt, if any
    pub fn reserve(&self, domain: &str, crawl_delay: Option<Duration>) -> Reservation {
        let interval = crawl_delay.map_or(self.min_interval, |d| d.max(self.min_interval));
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        let state = domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainState::new(self.max_concurrency));

        Reservation {
            wait: state.reserve(interval, Instant::now()),
            permits: state.permits(),
        }
    }

    /// Number of request slots reserved for a domain so far
    pub fn request_count(&self, domain: &str) -> u64 {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.get(domain).map_or(0, |s| s.request_count)
    }
}
