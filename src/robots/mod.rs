//! Robots.txt handling module
//!
//! Rules are loaded once per source at crawl start. Loading is best effort:
//! a source whose robots.txt cannot be fetched is crawled without rules.

mod parser;

pub use parser::ParsedRobots;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Loads robots.txt rules for an origin
#[async_trait]
pub trait RobotsProvider: Send + Sync {
    /// Returns the rules for the origin of `base_url`, or `None` on failure
    async fn load_rules(&self, base_url: &Url) -> Option<ParsedRobots>;
}

/// Provider for crawls that do not consult robots.txt
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRobots;

#[async_trait]
impl RobotsProvider for NoRobots {
    async fn load_rules(&self, _base_url: &Url) -> Option<ParsedRobots> {
        None
    }
}

/// Builds the robots.txt URL for the origin of a page URL
pub fn robots_url(base_url: &Url) -> Option<Url> {
    base_url.host_str()?;
    base_url.join("/robots.txt").ok()
}

/// Fetches robots.txt for the origin of `base_url`
///
/// # Returns
///
/// * `Some(rules)` - robots.txt was served (non-2xx answers allow everything)
/// * `None` - the request itself failed
pub async fn fetch_robots(client: &Client, base_url: &Url) -> Option<ParsedRobots> {
    let url = robots_url(base_url)?;

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to fetch robots.txt");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(url = %url, status = %response.status(), "No robots.txt served");
        return Some(ParsedRobots::allow_all());
    }

    match response.text().await {
        Ok(body) => Some(ParsedRobots::from_content(&body)),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to read robots.txt");
            None
        }
    }
}
