//! Content sources as crawl-time data
//!
//! Each configured source becomes one [`Source`]: its classifier, politeness
//! guard and seeds. Source identity is resolved once when a frontier entry is
//! created and travels with the entry from then on.

use crate::classify::{PageRole, SourceClassifier};
use crate::config::SourceConfig;
use crate::politeness::PolitenessGuard;
use crate::robots::ParsedRobots;
use crate::ConfigError;
use std::fmt;

/// Index of a source in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A configured content source
#[derive(Debug)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub seeds: Vec<String>,
    pub classifier: SourceClassifier,
    pub guard: PolitenessGuard,
    /// Whether links found on article pages are followed
    pub expand_articles: bool,
}

impl Source {
    /// Builds a source from its configuration
    ///
    /// # Arguments
    ///
    /// * `id` - Registry index
    /// * `config` - The source's configuration table
    /// * `robots` - Robots rules loaded for the source, if any
    /// * `robots_agent` - Product token checked against robots.txt groups
    pub fn from_config(
        id: SourceId,
        config: &SourceConfig,
        robots: Option<ParsedRobots>,
        robots_agent: &str,
    ) -> Result<Self, ConfigError> {
        let classifier = SourceClassifier::from_config(config.domains.clone(), &config.classifier)?;
        let guard = PolitenessGuard::from_patterns(
            &config.follow_patterns,
            &config.exclude_patterns,
            robots,
            robots_agent,
        )?;

        Ok(Self {
            id,
            name: config.name.clone(),
            seeds: config.seeds.clone(),
            classifier,
            guard,
            expand_articles: config.expand_articles,
        })
    }

    pub fn classify(&self, url: &str) -> PageRole {
        self.classifier.classify(url)
    }

    pub fn covers(&self, url: &str) -> bool {
        self.classifier.covers(url)
    }
}

/// All sources of a crawl, indexed by [`SourceId`]
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source built by `build`, which receives the assigned id
    pub fn register<F>(&mut self, build: F) -> Result<SourceId, ConfigError>
    where
        F: FnOnce(SourceId) -> Result<Source, ConfigError>,
    {
        let id = SourceId(self.sources.len());
        let source = build(id)?;
        self.sources.push(source);
        Ok(id)
    }

    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Finds the source owning a URL
    ///
    /// `preferred` (usually the source of the page the link was found on)
    /// wins when it covers the URL; otherwise the first covering source.
    pub fn resolve(&self, url: &str, preferred: Option<SourceId>) -> Option<SourceId> {
        if let Some(source) = preferred.and_then(|id| self.get(id)) {
            if source.covers(url) {
                return Some(source.id);
            }
        }
        self.sources.iter().find(|s| s.covers(url)).map(|s| s.id)
    }

    /// Finds a source by name
    pub fn by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }
}
