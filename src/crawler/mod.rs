//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier and source registry
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Link extraction and main-content extraction behind [`Extractor`]
//! - The phased worker pool and the single persistence writer
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;
mod source;
mod worker;
mod writer;

pub use coordinator::{build_sources, run_crawl, Coordinator, CrawlOptions};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::{extract_links, ExtractError, ExtractedArticle, Extractor, MainContentExtractor};
pub use scheduler::{CrawlPhase, CrawlSettings, Crawler};
pub use source::{Source, SourceId, SourceRegistry};
pub use worker::IDLE_WAIT;
pub use writer::{save_queue, spawn_writer, WriterMessage};
