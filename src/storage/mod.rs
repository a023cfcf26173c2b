//! Storage module for persisting crawled documents
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Change-detecting document upserts keyed by normalized URL
//! - Stale document selection for recrawl passes
//! - Aggregate counts for reporting

mod change;
mod schema;
mod sqlite;
mod traits;

pub use change::{plan_write, WriteKind};
pub use sqlite::SqliteStorage;
pub use traits::{StorageError, StorageResult, Store};

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A store shared between the scheduler and the writer task
pub type SharedStore = Arc<Mutex<dyn Store>>;

/// Opens (or creates) the SQLite store at `path`
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps a store for sharing across tasks
pub fn share<S: Store + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// A freshly extracted article on its way to storage
#[derive(Debug, Clone)]
pub struct ArticleSnapshot {
    /// URL as fetched
    pub url: String,
    pub normalized_url: String,
    /// Name of the source the page belongs to
    pub source: String,
    pub title: String,
    pub html: String,
    pub text: String,
    pub excerpt: String,
    /// Fingerprint of `html`
    pub content_hash: String,
    pub status_code: u16,
    pub fetched_at: DateTime<Utc>,
}

/// Position of a stale document in recrawl order
///
/// Stale documents are ordered by `(last_scraped, normalized_url)`, so the
/// last entry of one page is the cursor for the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCursor {
    pub last_scraped: DateTime<Utc>,
    pub normalized_url: String,
}

/// Per-source document aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStats {
    pub source: String,
    pub documents: u64,
    /// Mean stored HTML length in bytes
    pub avg_content_length: f64,
    pub max_scraped_count: u32,
    pub valid_documents: u64,
}

/// A persisted document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub normalized_url: String,
    pub url: String,
    pub source: String,
    pub title: String,
    pub html_content: String,
    pub content: String,
    pub excerpt: String,
    pub content_hash: String,
    /// Set on creation, never overwritten
    pub first_scraped: DateTime<Utc>,
    pub last_scraped: DateTime<Utc>,
    /// Last time the content fingerprint changed
    pub last_modified: DateTime<Utc>,
    pub scraped_count: u32,
    pub content_length: u64,
    pub status_code: Option<u16>,
    pub is_valid: bool,
}
