//! Crawler coordinator - startup and lifetime of a crawl process
//!
//! This module wires the collaborators together and owns the process-level
//! loop:
//! - Opening storage (fatal on failure, before any worker starts)
//! - Building the HTTP fetcher and loading robots.txt once per source
//! - Installing the operator control sources
//! - Running the crawl, then optional background recrawl cycles

use crate::config::Config;
use crate::control::{spawn_signal_listener, spawn_stdin_listener, ControlState};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::scheduler::{CrawlSettings, Crawler};
use crate::crawler::source::{Source, SourceRegistry};
use crate::output::print_report;
use crate::politeness::ChallengeSignatures;
use crate::robots::RobotsProvider;
use crate::state::RunReport;
use crate::storage::{open_storage, share};
use crate::url::normalize_for_dedup;
use crate::DriftnetError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Process-level options that are not part of the configuration file
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    /// Keep running recrawl cycles after the first run
    pub watch: bool,
    /// Read pause/resume/stop commands from standard input
    pub read_stdin: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    crawler: Crawler,
    control: ControlState,
    recrawl_interval: Duration,
    recrawl_enabled: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage opened and sources ready
    /// * `Err(DriftnetError)` - A startup failure; nothing was fetched
    pub async fn new(config: &Config) -> Result<Self, DriftnetError> {
        let db_path = Path::new(&config.output.database_path);
        let storage = open_storage(db_path).map_err(|e| {
            DriftnetError::Startup(format!(
                "cannot open database '{}': {}",
                db_path.display(),
                e
            ))
        })?;
        tracing::info!("Opened database {}", db_path.display());

        let fetcher = Arc::new(HttpFetcher::from_config(
            &config.user_agent,
            Duration::from_secs(config.crawler.timeout_secs),
            ChallengeSignatures::new(&config.politeness.challenge_signatures),
        )?);

        let sources = build_sources(config, fetcher.as_ref()).await?;
        let control = ControlState::new();

        let crawler = Crawler::new(
            CrawlSettings::from_config(config),
            sources,
            fetcher,
            share(storage),
            control.clone(),
        );

        Ok(Self {
            crawler,
            control,
            recrawl_interval: Duration::from_secs(config.recrawl.interval_minutes * 60),
            recrawl_enabled: config.recrawl.enabled,
        })
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    /// Runs the crawl, then recrawl cycles in watch mode until stopped
    ///
    /// # Returns
    ///
    /// The report of the main run
    pub async fn run(&self, watch: bool) -> RunReport {
        let report = self.crawler.run().await;
        print_report(&report);

        if watch && !self.control.is_stopped() {
            if self.recrawl_enabled {
                self.watch().await;
            } else {
                tracing::warn!("Watch mode requested but recrawl is disabled");
            }
        }

        report
    }

    async fn watch(&self) {
        let cancel = self.control.cancelled();
        let mut cycle = 0u64;

        while !self.control.is_stopped() {
            tracing::info!(
                "Next recrawl cycle in {} minutes",
                self.recrawl_interval.as_secs() / 60
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.recrawl_interval) => {}
            }
            if !self.control.wait_while_paused().await {
                break;
            }

            cycle += 1;
            let report = self.crawler.recrawl_cycle().await;
            tracing::info!(cycle, "Recrawl cycle finished: {}", report);
        }
    }
}

/// Builds the source registry, loading robots.txt once per source
///
/// Robots rules come from the origin of each source's first seed. A source
/// whose rules cannot be loaded is crawled without them.
pub async fn build_sources(
    config: &Config,
    robots: &dyn RobotsProvider,
) -> Result<SourceRegistry, DriftnetError> {
    let agent = config.user_agent.crawler_name.as_str();
    let mut registry = SourceRegistry::new();

    for source_config in &config.sources {
        let rules = match source_config.seeds.first() {
            Some(seed) => {
                let origin = Url::parse(normalize_for_dedup(seed).as_str())?;
                let rules = robots.load_rules(&origin).await;
                match &rules {
                    Some(_) => {
                        tracing::info!(source = %source_config.name, "Loaded robots.txt")
                    }
                    None => tracing::warn!(
                        source = %source_config.name,
                        "robots.txt unavailable; crawling without rules"
                    ),
                }
                rules
            }
            None => None,
        };

        registry.register(|id| Source::from_config(id, source_config, rules, agent))?;
    }

    Ok(registry)
}

/// Runs a complete crawl process
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
/// * `options` - Watch mode and control-surface options
///
/// # Returns
///
/// * `Ok(RunReport)` - The report of the main run
/// * `Err(DriftnetError)` - Startup failed
///
/// # Example
///
/// ```no_run
/// use driftnet::config::load_config;
/// use driftnet::crawler::{run_crawl, CrawlOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("driftnet.toml"))?;
/// let report = run_crawl(&config, CrawlOptions::default()).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, options: CrawlOptions) -> Result<RunReport, DriftnetError> {
    let coordinator = Coordinator::new(config).await?;
    let control = coordinator.control().clone();

    let signals = spawn_signal_listener(control.clone());
    if options.read_stdin {
        match spawn_stdin_listener(control.clone()) {
            Ok(_) => tracing::info!("Type 'pause', 'resume' or 'stop' to control the crawl"),
            Err(e) => tracing::warn!(error = %e, "Failed to start stdin control reader"),
        }
    }

    let report = coordinator.run(options.watch).await;
    signals.abort();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::robots::NoRobots;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(seed: &str, db_path: &str) -> Config {
        let host = Url::parse(seed).unwrap().host_str().unwrap().to_string();
        parse_config(&format!(
            r#"
            [crawler]
            max-depth = 1
            max-pages = 10
            workers = 2

            [user-agent]
            crawler-name = "TestCrawler"
            crawler-version = "1.0"
            contact-url = "https://example.com/about"
            contact-email = "admin@example.com"

            [output]
            database-path = "{db_path}"

            [[source]]
            name = "news"
            domains = ["{host}"]
            seeds = ["{seed}"]

            [source.classifier]
            kind = "dated-article"
            "#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_sources_without_robots() {
        let config = create_test_config("https://example.com/sport", "unused.db");
        let registry = build_sources(&config, &NoRobots).await.unwrap();

        let source = registry.by_name("news").unwrap();
        assert!(!source.guard.has_robots());
        assert_eq!(source.seeds, vec!["https://example.com/sport".to_string()]);
    }

    #[tokio::test]
    async fn test_build_sources_applies_robots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
            )
            .mount(&server)
            .await;

        let seed = format!("{}/sport", server.uri());
        let config = create_test_config(&seed, "unused.db");
        let fetcher = HttpFetcher::from_config(
            &config.user_agent,
            Duration::from_secs(5),
            ChallengeSignatures::default(),
        )
        .unwrap();

        let registry = build_sources(&config, &fetcher).await.unwrap();
        let source = registry.by_name("news").unwrap();

        assert!(source.guard.has_robots());
        assert!(!source.guard.allows(&format!("{}/private/page", server.uri())));
        assert!(source.guard.allows(&seed));
    }

    #[tokio::test]
    async fn test_unopenable_database_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("missing").join("nested").join("crawl.db");
        let config = create_test_config("https://example.com/sport", db_path.to_str().unwrap());

        let result = Coordinator::new(&config).await;
        assert!(matches!(result, Err(DriftnetError::Startup(_))));
    }
}
