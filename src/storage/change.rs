//! Change detection between a stored document and a fresh extraction

use crate::storage::{ArticleSnapshot, Document};
use std::fmt;

/// The persistence write selected for a fetched article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// No document existed; full content written
    Created,
    /// Fingerprint matched; only scrape metadata touched
    Unchanged,
    /// Fingerprint differed; content fields replaced
    Modified,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteKind::Created => "created",
            WriteKind::Unchanged => "unchanged",
            WriteKind::Modified => "modified",
        };
        f.write_str(name)
    }
}

/// Plans the write for a fetched article
///
/// # Arguments
///
/// * `existing` - The currently stored document, if any
/// * `article` - The fresh extraction
///
/// # Returns
///
/// The write kind and the full document row to store
pub fn plan_write(existing: Option<&Document>, article: &ArticleSnapshot) -> (WriteKind, Document) {
    let now = article.fetched_at;

    let Some(existing) = existing else {
        let document = Document {
            normalized_url: article.normalized_url.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            title: article.title.clone(),
            html_content: article.html.clone(),
            content: article.text.clone(),
            excerpt: article.excerpt.clone(),
            content_hash: article.content_hash.clone(),
            first_scraped: now,
            last_scraped: now,
            last_modified: now,
            scraped_count: 1,
            content_length: article.html.len() as u64,
            status_code: Some(article.status_code),
            is_valid: true,
        };
        return (WriteKind::Created, document);
    };

    let mut document = existing.clone();
    document.last_scraped = now;
    document.scraped_count = existing.scraped_count.saturating_add(1);

    if existing.content_hash == article.content_hash {
        return (WriteKind::Unchanged, document);
    }

    document.url = article.url.clone();
    document.title = article.title.clone();
    document.html_content = article.html.clone();
    document.content = article.text.clone();
    document.excerpt = article.excerpt.clone();
    document.content_hash = article.content_hash.clone();
    document.content_length = article.html.len() as u64;
    document.status_code = Some(article.status_code);
    document.last_modified = now;
    document.is_valid = true;

    (WriteKind::Modified, document)
}
