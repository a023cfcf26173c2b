use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, OutputConfig, PolitenessConfig, RecrawlConfig,
    SourceConfig, UserAgentConfig,
};
use crate::url::{domain_of, matches_any_domain, normalize_for_dedup};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_recrawl_config(&config.recrawl)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_politeness_config(&config.politeness)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.max_domain_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "max_domain_concurrency must be >= 1, got {}",
            config.max_domain_concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates recrawl configuration
fn validate_recrawl_config(config: &RecrawlConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "recrawl batch_size must be >= 1".to_string(),
        ));
    }

    if config.interval_minutes < 1 {
        return Err(ConfigError::Validation(
            "recrawl interval_minutes must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only letters, digits, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Url::parse(&config.referer)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.save_queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "save_queue_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.challenge_signatures.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "challenge_signatures cannot contain empty phrases".to_string(),
        ));
    }
    Ok(())
}

/// Validates source entries
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in sources {
        if source.name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        validate_source(source)?;
    }

    Ok(())
}

fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    if source.domains.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' must list at least one domain",
            source.name
        )));
    }

    for domain in &source.domains {
        validate_domain_pattern(domain)?;
    }

    if source.seeds.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' must have at least one seed URL",
            source.name
        )));
    }

    for seed in &source.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }

        let covered = domain_of(normalize_for_dedup(seed).as_str())
            .map(|host| matches_any_domain(&source.domains, &host))
            .unwrap_or(false);
        if !covered {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' is outside the domains of source '{}'",
                seed, source.name
            )));
        }
    }

    for pattern in source.follow_patterns.iter().chain(&source.exclude_patterns) {
        compile_pattern(pattern)?;
    }

    match &source.classifier {
        ClassifierConfig::DatedArticle(rules) => {
            compile_pattern(&rules.article_pattern)?;
            if rules.max_hub_segments < 1 {
                return Err(ConfigError::Validation(format!(
                    "Source '{}': max_hub_segments must be >= 1",
                    source.name
                )));
            }
        }
        ClassifierConfig::Namespaced(rules) => {
            if !rules.article_prefix.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "Source '{}': article_prefix must start with '/'",
                    source.name
                )));
            }
            if rules.hub_marker.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Source '{}': hub_marker cannot be empty",
                    source.name
                )));
            }
        }
    }

    Ok(())
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be lowercase letters, digits, '.' or '-'",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}
