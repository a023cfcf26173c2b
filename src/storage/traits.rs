//! Storage traits and error types

use crate::storage::{ArticleSnapshot, Document, SourceStats, StaleCursor, WriteKind};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for crawled documents
///
/// Writes are serialized by the crawler through a single writer task, so
/// implementations only need `Send`.
pub trait Store: Send {
    /// Checks whether a document exists for a normalized URL
    fn document_exists(&self, normalized_url: &str) -> StorageResult<bool>;

    /// Loads the stored document for a normalized URL
    fn get_document(&self, normalized_url: &str) -> StorageResult<Option<Document>>;

    /// Upserts a fetched article with change detection
    ///
    /// The lookup of the stored fingerprint and the write happen atomically.
    ///
    /// # Returns
    ///
    /// Which of the three write kinds was applied
    fn save_document(&mut self, article: &ArticleSnapshot) -> StorageResult<WriteKind>;

    /// One page of documents last scraped before `cutoff`, oldest first
    ///
    /// Only documents ordered strictly after `after` are returned, so a
    /// caller can walk the whole stale set even when earlier documents stay
    /// stale.
    fn stale_page(
        &self,
        cutoff: DateTime<Utc>,
        after: Option<&StaleCursor>,
        limit: usize,
    ) -> StorageResult<Vec<StaleCursor>>;

    /// Normalized URLs of documents last scraped before `cutoff`, oldest first
    fn stale_documents_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> StorageResult<Vec<String>> {
        Ok(self
            .stale_page(cutoff, None, limit)?
            .into_iter()
            .map(|entry| entry.normalized_url)
            .collect())
    }

    /// Normalized URLs of documents not scraped within `threshold_hours`
    fn stale_documents(&self, threshold_hours: u32, limit: usize) -> StorageResult<Vec<String>> {
        let cutoff = Utc::now() - Duration::hours(i64::from(threshold_hours));
        self.stale_documents_before(cutoff, limit)
    }

    /// Total number of stored documents
    fn count_documents(&self) -> StorageResult<u64>;

    /// Per-source aggregates, largest source first
    fn source_stats(&self) -> StorageResult<Vec<SourceStats>>;

    /// Sum of scrape counts over all documents
    fn total_scrapes(&self) -> StorageResult<u64>;
}
