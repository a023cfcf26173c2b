//! Page classification
//!
//! Every source owns one classifier, built once from its configuration and
//! looked up through the source id carried by each frontier entry.
//!
//! # Components
//!
//! - `PageRole`: Unknown, Hub or Article
//! - `PageClassifier`: a rule set over URL paths
//! - `SourceClassifier`: restricts a rule set to the source's domains

mod rules;

pub use rules::{DatedArticleRules, NamespacedRules};

use crate::config::ClassifierConfig;
use crate::url::{domain_of, matches_any_domain};
use crate::ConfigError;
use std::fmt;
use url::Url;

/// Path segments that never hold articles on news sites
pub const DEFAULT_EXCLUDED_SEGMENTS: &[&str] = &["video", "audio", "gallery", "crosswords"];

/// Date-stamped article paths such as `/2024/jan/1/`
pub const DEFAULT_ARTICLE_DATE_PATTERN: &str = r"/\d{4}/[a-z]{3}/\d{1,2}/";

pub const DEFAULT_MAX_HUB_SEGMENTS: usize = 3;

pub const DEFAULT_ARTICLE_PREFIX: &str = "/wiki/";

pub const DEFAULT_HUB_MARKER: &str = "Category:";

/// Wiki namespaces and actions that are never crawled
pub const DEFAULT_EXCLUDED_MARKERS: &[&str] = &[
    "File:",
    "Special:",
    "Talk:",
    "User:",
    "Template:",
    "Help:",
    "Wikipedia:",
    "Draft:",
    "Portal:",
    "Main_Page",
    "Template_talk:",
    "Category_talk:",
    "action=",
    "diff=",
    "oldid=",
];

/// Role of a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Neither persisted nor expanded
    Unknown,
    /// Valued for its outbound links
    Hub,
    /// Extracted and persisted
    Article,
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageRole::Unknown => "unknown",
            PageRole::Hub => "hub",
            PageRole::Article => "article",
        };
        f.write_str(name)
    }
}

/// A source-specific rule set over URL paths
///
/// Implementations are pure and never perform I/O.
pub trait PageClassifier: Send + Sync + fmt::Debug {
    fn classify_path(&self, path: &str, query: Option<&str>) -> PageRole;
}

/// A rule set bound to the domains of one source
#[derive(Debug)]
pub struct SourceClassifier {
    domains: Vec<String>,
    rules: Box<dyn PageClassifier>,
}

impl SourceClassifier {
    pub fn new(domains: Vec<String>, rules: Box<dyn PageClassifier>) -> Self {
        Self { domains, rules }
    }

    /// Builds the classifier described by a source's configuration
    pub fn from_config(
        domains: Vec<String>,
        config: &ClassifierConfig,
    ) -> Result<Self, ConfigError> {
        let rules: Box<dyn PageClassifier> = match config {
            ClassifierConfig::DatedArticle(rules) => Box::new(DatedArticleRules::from_config(rules)?),
            ClassifierConfig::Namespaced(rules) => Box::new(NamespacedRules::from_config(rules)),
        };
        Ok(Self::new(domains, rules))
    }

    /// Whether a normalized URL belongs to one of this source's domains
    pub fn covers(&self, url: &str) -> bool {
        domain_of(url).map_or(false, |host| matches_any_domain(&self.domains, &host))
    }

    /// Classifies a normalized URL
    ///
    /// URLs that do not parse or fall outside the source's domains are Unknown.
    pub fn classify(&self, url: &str) -> PageRole {
        let Ok(parsed) = Url::parse(url) else {
            return PageRole::Unknown;
        };
        if !self.covers(url) {
            return PageRole::Unknown;
        }
        self.rules.classify_path(parsed.path(), parsed.query())
    }
}
