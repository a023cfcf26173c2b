//! URL handling module for Driftnet
//!
//! This module provides URL normalization at two levels, host extraction
//! and source domain matching.
//!
//! - `normalize_for_dedup`: the frontier key (fragment and `www.` removed, query kept)
//! - `normalize_for_links`: the same, with the query string dropped as well

mod domain;
mod matcher;
mod normalize;

pub use domain::{domain_of, extract_domain};
pub use matcher::{matches_any_domain, matches_wildcard};
pub use normalize::{normalize_for_dedup, normalize_for_links, NormalizedUrl};
