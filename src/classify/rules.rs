//! Built-in classification rule sets

use crate::classify::{PageClassifier, PageRole};
use crate::config::{DatedArticleConfig, NamespacedConfig};
use crate::ConfigError;
use regex::Regex;

/// Rules for news-style sites whose articles carry a date in the path
///
/// - Any excluded segment (e.g. `video`) makes the page Unknown
/// - A path matching the article pattern is an Article
/// - A path with up to `max_hub_segments` segments is a Hub (the root included)
/// - Anything else is Unknown
#[derive(Debug)]
pub struct DatedArticleRules {
    excluded_segments: Vec<String>,
    article_pattern: Regex,
    max_hub_segments: usize,
}

impl DatedArticleRules {
    pub fn new(
        excluded_segments: Vec<String>,
        article_pattern: Regex,
        max_hub_segments: usize,
    ) -> Self {
        Self {
            excluded_segments,
            article_pattern,
            max_hub_segments,
        }
    }

    pub fn from_config(config: &DatedArticleConfig) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&config.article_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("'{}': {}", config.article_pattern, e))
        })?;
        Ok(Self::new(
            config.excluded_segments.clone(),
            pattern,
            config.max_hub_segments,
        ))
    }
}

impl PageClassifier for DatedArticleRules {
    fn classify_path(&self, path: &str, _query: Option<&str>) -> PageRole {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments
            .iter()
            .any(|segment| self.excluded_segments.iter().any(|ex| ex == segment))
        {
            return PageRole::Unknown;
        }

        if self.article_pattern.is_match(path) {
            return PageRole::Article;
        }

        if segments.len() <= self.max_hub_segments {
            return PageRole::Hub;
        }

        PageRole::Unknown
    }
}

/// Rules for wiki-style sites with namespaced page titles
///
/// - A reserved marker anywhere in the path or query makes the page Unknown
/// - A path containing the hub marker (e.g. `Category:`) is a Hub
/// - A path under the article prefix (e.g. `/wiki/`) is an Article
#[derive(Debug)]
pub struct NamespacedRules {
    article_prefix: String,
    hub_marker: String,
    excluded_markers: Vec<String>,
}

impl NamespacedRules {
    pub fn new(article_prefix: String, hub_marker: String, excluded_markers: Vec<String>) -> Self {
        Self {
            article_prefix,
            hub_marker,
            excluded_markers,
        }
    }

    pub fn from_config(config: &NamespacedConfig) -> Self {
        Self::new(
            config.article_prefix.clone(),
            config.hub_marker.clone(),
            config.excluded_markers.clone(),
        )
    }
}

impl PageClassifier for NamespacedRules {
    fn classify_path(&self, path: &str, query: Option<&str>) -> PageRole {
        let reserved = |marker: &String| {
            path.contains(marker.as_str()) || query.map_or(false, |q| q.contains(marker.as_str()))
        };
        if self.excluded_markers.iter().any(reserved) {
            return PageRole::Unknown;
        }

        if path.contains(&self.hub_marker) {
            return PageRole::Hub;
        }

        if path.starts_with(&self.article_prefix) {
            return PageRole::Article;
        }

        PageRole::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated() -> DatedArticleRules {
        DatedArticleRules::from_config(&DatedArticleConfig::default()).unwrap()
    }

    fn namespaced() -> NamespacedRules {
        NamespacedRules::from_config(&NamespacedConfig::default())
    }

    #[test]
    fn test_dated_article() {
        let rules = dated();
        assert_eq!(
            rules.classify_path("/sport/2024/jan/1/article-a", None),
            PageRole::Article
        );
        assert_eq!(
            rules.classify_path("/world/2023/dec/31/some-story", None),
            PageRole::Article
        );
    }

    #[test]
    fn test_dated_hubs() {
        let rules = dated();
        assert_eq!(rules.classify_path("/", None), PageRole::Hub);
        assert_eq!(rules.classify_path("/sport", None), PageRole::Hub);
        assert_eq!(rules.classify_path("/sport/football/premier", None), PageRole::Hub);
    }

    #[test]
    fn test_dated_deep_non_article_is_unknown() {
        let rules = dated();
        assert_eq!(
            rules.classify_path("/sport/football/premier/table", None),
            PageRole::Unknown
        );
    }

    #[test]
    fn test_dated_excluded_segments() {
        let rules = dated();
        assert_eq!(
            rules.classify_path("/world/video/2024/jan/1/clip", None),
            PageRole::Unknown
        );
        assert_eq!(rules.classify_path("/crosswords", None), PageRole::Unknown);
        // Excluded names only count as whole segments
        assert_eq!(rules.classify_path("/videogames", None), PageRole::Hub);
    }

    #[test]
    fn test_namespaced_roles() {
        let rules = namespaced();
        assert_eq!(
            rules.classify_path("/wiki/Rust_(programming_language)", None),
            PageRole::Article
        );
        assert_eq!(
            rules.classify_path("/wiki/Category:Physics", None),
            PageRole::Hub
        );
        assert_eq!(rules.classify_path("/w/index.php", None), PageRole::Unknown);
    }

    #[test]
    fn test_namespaced_reserved_markers() {
        let rules = namespaced();
        assert_eq!(rules.classify_path("/wiki/Main_Page", None), PageRole::Unknown);
        assert_eq!(
            rules.classify_path("/wiki/Special:Random", None),
            PageRole::Unknown
        );
        assert_eq!(
            rules.classify_path("/wiki/Category_talk:Physics", None),
            PageRole::Unknown
        );
        assert_eq!(
            rules.classify_path("/wiki/Physics", Some("action=edit")),
            PageRole::Unknown
        );
    }
}
