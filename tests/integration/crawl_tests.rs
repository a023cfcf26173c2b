//! Integration tests for the crawler
//!
//! Most tests drive the scheduler through in-memory fetchers so that fetch
//! ordering and timing can be observed. The last group runs the full stack
//! against a wiremock server.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use driftnet::config::{
    parse_config, ClassifierConfig, Config, DatedArticleConfig, RecrawlConfig, SourceConfig,
};
use driftnet::crawler::{
    run_crawl, CrawlOptions, CrawlSettings, Crawler, FetchError, FetchedPage, Fetcher, Source,
    SourceRegistry,
};
use driftnet::storage::{open_storage, ArticleSnapshot, SharedStore, SqliteStorage, Store};
use driftnet::{content_fingerprint, ControlState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEED: &str = "https://example.com/sport";
const ARTICLE_A: &str = "https://example.com/sport/2024/jan/1/article-a";

/// Serves fixed pages and records every request
struct PageFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl PageFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: Mutex::new(
                pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn set_page(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        let body = self.pages.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(FetchedPage {
                final_url: url.to_string(),
                status: 200,
                body,
            }),
            None => Err(FetchError::Http { code: 404 }),
        }
    }
}

fn create_test_settings(max_depth: u32) -> CrawlSettings {
    CrawlSettings {
        workers: 2,
        max_depth,
        max_pages: 100,
        min_article_chars: 0,
        delay: Duration::ZERO,
        max_domain_concurrency: 2,
        save_queue_capacity: 16,
        recrawl: RecrawlConfig::default(),
    }
}

fn create_registry(seeds: &[&str], exclude: &[&str]) -> SourceRegistry {
    let config = SourceConfig {
        name: "news".to_string(),
        domains: vec!["example.com".to_string()],
        seeds: seeds.iter().map(|s| s.to_string()).collect(),
        follow_patterns: vec![],
        exclude_patterns: exclude.iter().map(|s| s.to_string()).collect(),
        expand_articles: true,
        classifier: ClassifierConfig::DatedArticle(DatedArticleConfig::default()),
    };
    let mut registry = SourceRegistry::new();
    registry
        .register(|id| Source::from_config(id, &config, None, "TestBot"))
        .unwrap();
    registry
}

fn article_html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><article><h1>{title}</h1><p>{body}</p></article></body></html>"
    )
}

fn stored_article(url: &str, age_hours: i64) -> ArticleSnapshot {
    let html = "<p>Old story</p>";
    ArticleSnapshot {
        url: url.to_string(),
        normalized_url: url.to_string(),
        source: "news".to_string(),
        title: "Old".to_string(),
        html: html.to_string(),
        text: "Old story".to_string(),
        excerpt: "Old story".to_string(),
        content_hash: content_fingerprint(html),
        status_code: 200,
        fetched_at: Utc::now() - ChronoDuration::hours(age_hours),
    }
}

#[tokio::test]
async fn test_discovery_dedups_and_excludes() {
    let fetcher = Arc::new(PageFetcher::new(&[
        (
            SEED,
            r#"<html><body>
            <a href="/sport/2024/jan/1/article-a">A</a>
            <a href="/sport/2024/jan/1/article-a?ref=x">A again</a>
            <a href="/about">About</a>
            </body></html>"#,
        ),
        (ARTICLE_A, &article_html("Article A", "The match ended in a draw.")),
    ]));
    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let store: SharedStore = storage.clone();

    let crawler = Crawler::new(
        create_test_settings(1),
        create_registry(&[SEED], &["^/about"]),
        fetcher.clone(),
        store,
        ControlState::new(),
    );
    let report = crawler.run().await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.created, 1);
    assert_eq!(crawler.frontier().size(), 2);
    assert!(!fetcher
        .requests()
        .iter()
        .any(|url| url.contains("/about")));

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_documents().unwrap(), 1);
    let document = storage.get_document(ARTICLE_A).unwrap().unwrap();
    assert_eq!(document.title, "Article A");
    assert_eq!(document.scraped_count, 1);
    assert!(document.content.contains("ended in a draw"));
}

/// Records fetch start and end events, holding each fetch briefly
struct EventFetcher {
    inner: PageFetcher,
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl Fetcher for EventFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.events.lock().unwrap().push(format!("start {}", url));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let result = self.inner.fetch(url).await;
        self.events.lock().unwrap().push(format!("end {}", url));
        result
    }
}

#[tokio::test]
async fn test_recrawl_finishes_before_discovery() {
    let stale = "https://example.com/sport/2023/dec/1/old-story";
    let fetcher = Arc::new(EventFetcher {
        inner: PageFetcher::new(&[
            (SEED, "<html><body><p>Sport</p></body></html>"),
            (stale, &article_html("Old", "Updated story text.")),
        ]),
        events: Mutex::new(Vec::new()),
    });

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    storage
        .lock()
        .unwrap()
        .save_document(&stored_article(stale, 48))
        .unwrap();
    let store: SharedStore = storage.clone();

    let crawler = Crawler::new(
        create_test_settings(1),
        create_registry(&[SEED], &[]),
        fetcher.clone(),
        store,
        ControlState::new(),
    );
    let report = crawler.run().await;

    let events = fetcher.events.lock().unwrap().clone();
    let recrawl_end = events
        .iter()
        .position(|e| e == &format!("end {}", stale))
        .unwrap();
    let discovery_start = events
        .iter()
        .position(|e| e == &format!("start {}", SEED))
        .unwrap();
    assert!(recrawl_end < discovery_start, "events: {:?}", events);

    assert_eq!(report.modified, 1);
    let document = storage.lock().unwrap().get_document(stale).unwrap().unwrap();
    assert_eq!(document.scraped_count, 2);
    assert!(document.content.contains("Updated story text"));
}

#[tokio::test]
async fn test_stale_documents_respect_threshold() {
    let fresh = "https://example.com/sport/2024/jan/2/fresh";
    let fetcher = Arc::new(PageFetcher::new(&[(fresh, &article_html("Fresh", "Text"))]));

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    storage
        .lock()
        .unwrap()
        .save_document(&stored_article(fresh, 1))
        .unwrap();
    let store: SharedStore = storage.clone();

    let crawler = Crawler::new(
        create_test_settings(0),
        create_registry(&[], &[]),
        fetcher.clone(),
        store,
        ControlState::new(),
    );
    let report = crawler.run().await;

    assert_eq!(report.pages_fetched, 0);
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_failing_stale_documents_do_not_block_later_ones() {
    let deleted = "https://example.com/sport/2023/dec/1/deleted";
    let live = "https://example.com/sport/2023/dec/2/live";
    let fetcher = Arc::new(PageFetcher::new(&[(live, &article_html("Live", "Still here."))]));

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    {
        let mut storage = storage.lock().unwrap();
        storage.save_document(&stored_article(deleted, 96)).unwrap();
        storage.save_document(&stored_article(live, 48)).unwrap();
    }
    let store: SharedStore = storage.clone();

    let mut settings = create_test_settings(0);
    settings.recrawl.batch_size = 1;

    let crawler = Crawler::new(
        settings,
        create_registry(&[], &[]),
        fetcher.clone(),
        store,
        ControlState::new(),
    );
    let report = crawler.run().await;

    assert_eq!(
        fetcher.requests(),
        vec![deleted.to_string(), live.to_string()]
    );
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.modified, 1);

    let document = storage.lock().unwrap().get_document(live).unwrap().unwrap();
    assert_eq!(document.scraped_count, 2);
}

/// Blocks the first fetch of one URL until released
struct GatedFetcher {
    inner: PageFetcher,
    gated_url: String,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if url == self.gated_url {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch(url).await
    }
}

#[tokio::test]
async fn test_pause_lets_in_flight_fetch_finish() {
    let seed_article = "https://example.com/sport/2024/jan/1/lead";
    let fetcher = Arc::new(GatedFetcher {
        inner: PageFetcher::new(&[
            (
                seed_article,
                r#"<html><body><article><h1>Lead</h1><p>Lead story.</p>
                <a href="/sport/2024/jan/1/second">Second</a>
                <a href="/sport/2024/jan/1/third">Third</a>
                </article></body></html>"#,
            ),
            (
                "https://example.com/sport/2024/jan/1/second",
                &article_html("Second", "Second story."),
            ),
            (
                "https://example.com/sport/2024/jan/1/third",
                &article_html("Third", "Third story."),
            ),
        ]),
        gated_url: seed_article.to_string(),
        entered: Notify::new(),
        release: Notify::new(),
    });

    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let store: SharedStore = storage.clone();
    let control = ControlState::new();

    let crawler = Arc::new(Crawler::new(
        create_test_settings(2),
        create_registry(&[seed_article], &[]),
        fetcher.clone(),
        store,
        control.clone(),
    ));
    let run = tokio::spawn({
        let crawler = Arc::clone(&crawler);
        async move { crawler.run().await }
    });

    fetcher.entered.notified().await;
    assert!(control.pause());
    fetcher.release.notify_one();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fetcher.inner.requests(), vec![seed_article.to_string()]);
    assert!(crawler.frontier().pending() > 0);

    control.stop();
    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not stop")
        .unwrap();

    assert!(report.stopped);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.created, 1);
    assert_eq!(fetcher.inner.requests().len(), 1);
    assert!(storage
        .lock()
        .unwrap()
        .document_exists(seed_article)
        .unwrap());
}

#[tokio::test]
async fn test_resume_continues_crawl() {
    let fetcher = Arc::new(PageFetcher::new(&[
        (SEED, r#"<a href="/sport/2024/jan/1/article-a">A</a>"#),
        (ARTICLE_A, &article_html("Article A", "Body")),
    ]));
    let control = ControlState::new();
    assert!(control.pause());

    let crawler = Arc::new(Crawler::new(
        create_test_settings(1),
        create_registry(&[SEED], &[]),
        fetcher.clone(),
        driftnet::storage::share(SqliteStorage::new_in_memory().unwrap()),
        control.clone(),
    ));
    let run = tokio::spawn({
        let crawler = Arc::clone(&crawler);
        async move { crawler.run().await }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(fetcher.requests().is_empty());

    assert!(control.resume());
    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not finish")
        .unwrap();

    assert!(!report.stopped);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn test_change_detection_across_runs() {
    let url = "https://example.com/sport/2024/mar/5/story";
    let fetcher = Arc::new(PageFetcher::new(&[(url, &article_html("Story", "First version."))]));
    let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));

    let mut settings = create_test_settings(0);
    settings.recrawl.threshold_hours = 0;

    let run_once = || {
        let store: SharedStore = storage.clone();
        Crawler::new(
            settings.clone(),
            create_registry(&[url], &[]),
            fetcher.clone(),
            store,
            ControlState::new(),
        )
    };

    let first = run_once().run().await;
    assert_eq!(first.created, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = run_once().run().await;
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.pages_fetched, 1);

    fetcher.set_page(url, &article_html("Story", "Second version."));
    tokio::time::sleep(Duration::from_millis(20)).await;
    let third = run_once().run().await;
    assert_eq!(third.modified, 1);

    let document = storage.lock().unwrap().get_document(url).unwrap().unwrap();
    assert_eq!(document.scraped_count, 3);
    assert!(document.content.contains("Second version"));
    assert!(document.last_modified > document.first_scraped);
}

fn create_test_config(server_uri: &str, db_path: &str) -> Config {
    let host = url::Url::parse(server_uri)
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();
    parse_config(&format!(
        r#"
        [crawler]
        max-depth = 1
        max-pages = 20
        workers = 2
        delay-ms = 0
        timeout-secs = 5
        min-article-chars = 10

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"
        contact-url = "https://example.com/contact"
        contact-email = "test@example.com"

        [output]
        database-path = "{db_path}"

        [[source]]
        name = "local-news"
        domains = ["{host}"]
        seeds = ["{server_uri}/sport"]
        exclude-patterns = ["^/about"]

        [source.classifier]
        kind = "dated-article"
        "#
    ))
    .unwrap()
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body>
                    <a href="/sport/2024/jan/1/article-a">A</a>
                    <a href="/sport/2024/jan/1/article-a?ref=x">A again</a>
                    <a href="/private/2024/jan/1/secret">Secret</a>
                    <a href="/about">About</a>
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sport/2024/jan/1/article-a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Article A", "A long enough story body."))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/2024/jan/1/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = create_test_config(&base_url, db_path.to_str().unwrap());

    let report = run_crawl(
        &config,
        CrawlOptions {
            watch: false,
            read_stdin: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.created, 1);
    assert!(!report.stopped);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_documents().unwrap(), 1);
    let by_source = storage.source_stats().unwrap();
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].source, "local-news");
    assert_eq!(by_source[0].documents, 1);
    assert_eq!(by_source[0].valid_documents, 1);
    let document = storage
        .get_document(&format!("{}/sport/2024/jan/1/article-a", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(document.title, "Article A");
    assert_eq!(document.status_code, Some(200));
}

#[tokio::test]
async fn test_bot_challenge_is_not_saved() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/sport/2024/jan/1/blocked">Blocked</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sport/2024/jan/1/blocked"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><article>Please complete the CAPTCHA to continue reading.</article></body></html>",
        ))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = create_test_config(&base_url, db_path.to_str().unwrap());

    let report = run_crawl(&config, CrawlOptions::default()).await.unwrap();

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.articles_saved(), 0);
    assert_eq!(open_storage(&db_path).unwrap().count_documents().unwrap(), 0);
}

#[tokio::test]
async fn test_second_run_recrawls_instead_of_rediscovering() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sport"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/sport/2024/jan/1/article-a">A</a>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sport/2024/jan/1/article-a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_html("Article A", "A long enough story body.")),
        )
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let mut config = create_test_config(&base_url, db_path.to_str().unwrap());
    config.recrawl.threshold_hours = 0;

    let first = run_crawl(&config, CrawlOptions::default()).await.unwrap();
    assert_eq!(first.created, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = run_crawl(&config, CrawlOptions::default()).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.unchanged, 1);

    let storage = open_storage(&db_path).unwrap();
    let document = storage
        .get_document(&format!("{}/sport/2024/jan/1/article-a", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(document.scraped_count, 2);
}
