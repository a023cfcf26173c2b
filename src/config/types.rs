use crate::classify::{
    DEFAULT_ARTICLE_DATE_PATTERN, DEFAULT_ARTICLE_PREFIX, DEFAULT_EXCLUDED_MARKERS,
    DEFAULT_EXCLUDED_SEGMENTS, DEFAULT_HUB_MARKER, DEFAULT_MAX_HUB_SEGMENTS,
};
use crate::politeness::DEFAULT_CHALLENGE_SIGNATURES;
use serde::Deserialize;

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub recrawl: RecrawlConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum discovery depth from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of pages fetched during discovery
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Number of concurrent workers
    pub workers: usize,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Maximum number of simultaneous fetches against one domain
    #[serde(rename = "max-domain-concurrency", default = "default_domain_concurrency")]
    pub max_domain_concurrency: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Articles with less extracted text than this are not persisted
    #[serde(rename = "min-article-chars", default = "default_min_article_chars")]
    pub min_article_chars: usize,
}

/// Recrawl pass configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecrawlConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Documents last scraped longer ago than this are stale
    #[serde(rename = "threshold-hours", default = "default_threshold_hours")]
    pub threshold_hours: u32,

    /// Number of stale documents selected per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Interval between background recrawl passes in watch mode
    #[serde(rename = "interval-minutes", default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for RecrawlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_hours: default_threshold_hours(),
            batch_size: default_batch_size(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Referer header sent with every request
    #[serde(default = "default_referer")]
    pub referer: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Capacity of the queue between workers and the writer
    #[serde(rename = "save-queue-capacity", default = "default_save_queue_capacity")]
    pub save_queue_capacity: usize,
}

/// Politeness settings shared by every source
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Case-insensitive phrases that mark a bot-challenge page
    #[serde(rename = "challenge-signatures", default = "default_challenge_signatures")]
    pub challenge_signatures: Vec<String>,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            challenge_signatures: default_challenge_signatures(),
        }
    }
}

/// A content source: its domains, seeds, link filters and page rules
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,

    /// Domain patterns (e.g., "example.com" or "*.example.com")
    pub domains: Vec<String>,

    pub seeds: Vec<String>,

    /// Regular expressions; when non-empty a link must match one of them
    #[serde(rename = "follow-patterns", default)]
    pub follow_patterns: Vec<String>,

    /// Regular expressions; a matching link is never fetched
    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    /// Whether links found on article pages are followed
    #[serde(rename = "expand-articles", default = "default_true")]
    pub expand_articles: bool,

    pub classifier: ClassifierConfig,
}

/// Page classification rules for a source
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClassifierConfig {
    /// News-style sites with date-stamped article paths
    DatedArticle(DatedArticleConfig),
    /// Wiki-style sites with namespaced paths
    Namespaced(NamespacedConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatedArticleConfig {
    /// Path segments that make a page Unknown (e.g., "video")
    #[serde(rename = "excluded-segments", default = "default_excluded_segments")]
    pub excluded_segments: Vec<String>,

    /// Regular expression matched against the path of article pages
    #[serde(rename = "article-pattern", default = "default_article_pattern")]
    pub article_pattern: String,

    /// Paths with up to this many segments are hubs
    #[serde(rename = "max-hub-segments", default = "default_max_hub_segments")]
    pub max_hub_segments: usize,
}

impl Default for DatedArticleConfig {
    fn default() -> Self {
        Self {
            excluded_segments: default_excluded_segments(),
            article_pattern: default_article_pattern(),
            max_hub_segments: default_max_hub_segments(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespacedConfig {
    /// Path prefix of article pages (e.g., "/wiki/")
    #[serde(rename = "article-prefix", default = "default_article_prefix")]
    pub article_prefix: String,

    /// Marker that identifies hub pages (e.g., "Category:")
    #[serde(rename = "hub-marker", default = "default_hub_marker")]
    pub hub_marker: String,

    /// Markers that make a page Unknown wherever they appear
    #[serde(rename = "excluded-markers", default = "default_excluded_markers")]
    pub excluded_markers: Vec<String>,
}

impl Default for NamespacedConfig {
    fn default() -> Self {
        Self {
            article_prefix: default_article_prefix(),
            hub_marker: default_hub_marker(),
            excluded_markers: default_excluded_markers(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_domain_concurrency() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_article_chars() -> usize {
    200
}

fn default_threshold_hours() -> u32 {
    24
}

fn default_batch_size() -> usize {
    200
}

fn default_interval_minutes() -> u64 {
    5
}

fn default_referer() -> String {
    "https://www.google.com/".to_string()
}

fn default_save_queue_capacity() -> usize {
    1000
}

fn default_challenge_signatures() -> Vec<String> {
    DEFAULT_CHALLENGE_SIGNATURES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_segments() -> Vec<String> {
    DEFAULT_EXCLUDED_SEGMENTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_article_pattern() -> String {
    DEFAULT_ARTICLE_DATE_PATTERN.to_string()
}

fn default_max_hub_segments() -> usize {
    DEFAULT_MAX_HUB_SEGMENTS
}

fn default_article_prefix() -> String {
    DEFAULT_ARTICLE_PREFIX.to_string()
}

fn default_hub_marker() -> String {
    DEFAULT_HUB_MARKER.to_string()
}

fn default_excluded_markers() -> Vec<String> {
    DEFAULT_EXCLUDED_MARKERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
