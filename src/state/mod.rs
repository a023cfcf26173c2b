//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlCounters`: Process-wide atomic counts for one run, and the `RunReport` taken from them
//! - `DomainPacer`: Per-domain request spacing and concurrency limits

mod counters;
mod domain_state;

pub use counters::{CrawlCounters, RunReport};
pub use domain_state::{DomainPacer, DomainState, Reservation};
