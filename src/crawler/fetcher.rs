//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the crawler's User-Agent and Referer headers
//! - GET requests with a per-request timeout
//! - Redirect handling, capped at [`MAX_REDIRECT_HOPS`]
//! - Error classification
//! - Bot-challenge detection on response bodies

use crate::config::UserAgentConfig;
use crate::politeness::{ChallengeSignatures, MAX_REDIRECT_HOPS};
use crate::robots::{fetch_robots, ParsedRobots, RobotsProvider};
use crate::DriftnetError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body content
    pub body: String,
}

/// Why a fetch failed
///
/// All variants are transient for the crawl: the URL is dropped for the
/// current pass and picked up again by a later recrawl if it stays stale.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("more than {} redirects", MAX_REDIRECT_HOPS)]
    TooManyRedirects,

    #[error("HTTP {code}")]
    Http { code: u16 },

    #[error("bot challenge detected ('{signature}')")]
    BotChallenge { signature: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_redirect() {
            FetchError::TooManyRedirects
        } else if let Some(status) = e.status() {
            FetchError::Http {
                code: status.as_u16(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Fetches page bodies for the crawler
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Hard timeout for a whole request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(DriftnetError)` - Invalid header values or client construction failure
///
/// # Example
///
/// ```no_run
/// use driftnet::config::UserAgentConfig;
/// use driftnet::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Driftnet".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     referer: "https://www.google.com/".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, DriftnetError> {
    let mut headers = HeaderMap::new();
    let referer = HeaderValue::from_str(&config.referer)
        .map_err(|e| DriftnetError::Startup(format!("invalid referer header: {}", e)))?;
    headers.insert(REFERER, referer);

    let client = Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECT_HOPS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Default [`Fetcher`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    challenges: ChallengeSignatures,
}

impl HttpFetcher {
    pub fn new(client: Client, challenges: ChallengeSignatures) -> Self {
        Self { client, challenges }
    }

    /// Builds the client and fetcher from configuration
    pub fn from_config(
        config: &UserAgentConfig,
        timeout: Duration,
        challenges: ChallengeSignatures,
    ) -> Result<Self, DriftnetError> {
        Ok(Self::new(build_http_client(config, timeout)?, challenges))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Http {
                code: status.as_u16(),
            });
        }

        let body = response.text().await?;

        if let Some(signature) = self.challenges.detect(&body) {
            return Err(FetchError::BotChallenge {
                signature: signature.to_string(),
            });
        }

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RobotsProvider for HttpFetcher {
    async fn load_rules(&self, base_url: &Url) -> Option<ParsedRobots> {
        fetch_robots(&self.client, base_url).await
    }
}
