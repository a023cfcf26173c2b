//! Statistics generation from the document database
//!
//! This module provides functionality for extracting and displaying
//! document statistics from the storage layer.

use crate::storage::{SourceStats, StorageResult, Store};

/// Document statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStatistics {
    /// Total number of stored documents
    pub total_documents: u64,

    /// Sum of scrape counts over all documents
    pub total_scrapes: u64,

    /// Per-source aggregates, largest source first
    pub by_source: Vec<SourceStats>,

    /// Documents older than the recrawl threshold
    pub stale_documents: u64,

    /// The threshold used for `stale_documents`
    pub threshold_hours: u32,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `threshold_hours` - Age after which a document counts as stale
///
/// # Returns
///
/// * `Ok(DocumentStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &dyn Store, threshold_hours: u32) -> StorageResult<DocumentStatistics> {
    let total_documents = store.count_documents()?;
    let total_scrapes = store.total_scrapes()?;
    let by_source = store.source_stats()?;
    let stale_documents = store.stale_documents(threshold_hours, usize::MAX)?.len() as u64;

    Ok(DocumentStatistics {
        total_documents,
        total_scrapes,
        by_source,
        stale_documents,
        threshold_hours,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DocumentStatistics) {
    println!("=== Document Statistics ===\n");

    println!("Overview:");
    println!("  Total documents: {}", stats.total_documents);
    println!("  Total scrapes: {}", stats.total_scrapes);
    println!(
        "  Stale documents (older than {}h): {}",
        stats.threshold_hours, stats.stale_documents
    );
    println!();

    if !stats.by_source.is_empty() {
        println!("Documents by Source:");
        for source in &stats.by_source {
            let percentage = if stats.total_documents > 0 {
                (source.documents as f64 / stats.total_documents as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {}: {} ({:.1}%), {} valid, avg {:.0} bytes, max {} scrapes",
                source.source,
                source.documents,
                percentage,
                source.valid_documents,
                source.avg_content_length,
                source.max_scraped_count
            );
        }
        println!();
    }

    let average = if stats.total_documents > 0 {
        stats.total_scrapes as f64 / stats.total_documents as f64
    } else {
        0.0
    };
    println!("Average scrapes per document: {:.2}", average);
}
