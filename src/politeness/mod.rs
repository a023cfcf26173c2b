//! Politeness guard
//!
//! Decides whether a candidate URL may be fetched for a source:
//! - URLs without a host are rejected
//! - Exclude patterns win over follow patterns
//! - A non-empty follow list must match
//! - Robots rules, when loaded, must allow the URL
//!
//! Bodies are also checked against bot-challenge signatures after each fetch,
//! and redirects are capped at [`MAX_REDIRECT_HOPS`].

mod challenge;

pub use challenge::{ChallengeSignatures, DEFAULT_CHALLENGE_SIGNATURES};

use crate::robots::ParsedRobots;
use crate::ConfigError;
use regex::Regex;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Crawl-wide cap on HTTP redirect hops per request
pub const MAX_REDIRECT_HOPS: usize = 15;

/// Why the guard refused a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoHost,
    Excluded(String),
    NotFollowed,
    RobotsDisallowed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoHost => write!(f, "no host"),
            Rejection::Excluded(pattern) => write!(f, "excluded by '{}'", pattern),
            Rejection::NotFollowed => write!(f, "no follow pattern matched"),
            Rejection::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
        }
    }
}

/// Per-source fetch gate
#[derive(Debug, Clone)]
pub struct PolitenessGuard {
    follow: Vec<Regex>,
    exclude: Vec<Regex>,
    robots: Option<ParsedRobots>,
    robots_agent: String,
}

impl PolitenessGuard {
    /// Creates a guard from compiled patterns
    ///
    /// # Arguments
    ///
    /// * `follow` - Patterns a URL must match one of (empty allows all)
    /// * `exclude` - Patterns that reject a URL
    /// * `robots` - Robots rules, or `None` when they could not be loaded
    /// * `robots_agent` - Product token checked against robots.txt groups
    pub fn new(
        follow: Vec<Regex>,
        exclude: Vec<Regex>,
        robots: Option<ParsedRobots>,
        robots_agent: impl Into<String>,
    ) -> Self {
        Self {
            follow,
            exclude,
            robots,
            robots_agent: robots_agent.into(),
        }
    }

    /// Compiles follow and exclude patterns from configuration
    pub fn from_patterns(
        follow: &[String],
        exclude: &[String],
        robots: Option<ParsedRobots>,
        robots_agent: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            compile_all(follow)?,
            compile_all(exclude)?,
            robots,
            robots_agent,
        ))
    }

    /// Checks a URL, returning the reason when it must not be fetched
    pub fn check(&self, url: &str) -> Result<(), Rejection> {
        let Ok(parsed) = Url::parse(url) else {
            return Err(Rejection::NoHost);
        };
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(Rejection::NoHost);
        }

        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };
        let matches = |re: &Regex| re.is_match(url) || re.is_match(&path);

        if let Some(pattern) = self.exclude.iter().find(|re| matches(*re)) {
            return Err(Rejection::Excluded(pattern.as_str().to_string()));
        }

        if !self.follow.is_empty() && !self.follow.iter().any(|re| matches(re)) {
            return Err(Rejection::NotFollowed);
        }

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(url, &self.robots_agent) {
                return Err(Rejection::RobotsDisallowed);
            }
        }

        Ok(())
    }

    pub fn allows(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }

    /// Crawl-delay requested by robots.txt for our agent
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots
            .as_ref()
            .and_then(|r| r.crawl_delay(&self.robots_agent))
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    pub fn has_robots(&self) -> bool {
        self.robots.is_some()
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
        })
        .collect()
}
