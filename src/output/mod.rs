//! Output module for run reports and database statistics
//!
//! This module handles:
//! - Printing the end-of-run report
//! - Loading and printing document statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, DocumentStatistics};

use crate::state::RunReport;

/// Prints the run report to stdout
///
/// The first line is the summary the report displays as; the breakdown
/// follows.
pub fn print_report(report: &RunReport) {
    println!("{}", report);
    println!(
        "  created: {} | modified: {} | unchanged: {}",
        report.created, report.modified, report.unchanged
    );
    println!(
        "  fetch failures: {} | extract failures: {} | save failures: {}",
        report.fetch_failures, report.extract_failures, report.save_failures
    );
    println!(
        "  elapsed: {:.1}s ({:.2} pages/sec){}",
        report.elapsed.as_secs_f64(),
        report.pages_per_second(),
        if report.stopped { " [stopped]" } else { "" }
    );
}
