//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end through the real HTTP page source.

use std::collections::HashSet;
use sumi_strata::config::{
    BrowserConfig, Config, CrawlMode, CrawlerConfig, DiscoveryConfig, FetchMode, OutputConfig,
    UserAgentConfig,
};
use sumi_strata::crawler::Coordinator;
use sumi_strata::output::UrlList;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a static-fetch test configuration rooted at `base_url`
fn create_test_config(base_url: &str, dir: &TempDir, mode: CrawlMode, max_pages: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            mode,
            max_pages,
            max_depth: 1,
            fetch_mode: FetchMode::Static,
            dynamic_discovery: false,
            batch_size: 3,
            workers: 3,
            dynamic_workers: 2,
            request_timeout: 5,
        },
        discovery: DiscoveryConfig::default().without_waits(),
        browser: BrowserConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            urls_path: dir.path().join("crawled_urls.json").display().to_string(),
            output_dir: dir.path().join("extracted").display().to_string(),
            extract_workers: 2,
            extract_timeout: 5,
        },
    }
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

fn links_page(title: &str, hrefs: &[String]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|h| format!(r#"<a href="{}">{}</a>"#, h, h))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

#[tokio::test]
async fn test_complete_graph_stops_at_max_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    // 20 pages, each linking to every page
    let paths: Vec<String> = std::iter::once("/".to_string())
        .chain((1..20).map(|i| format!("/n{}", i)))
        .collect();
    for p in &paths {
        mount_page(&mock_server, p, links_page(p, &paths)).await;
    }

    let config = create_test_config(&base_url, &dir, CrawlMode::Exhaustive, 5);
    let coordinator = Coordinator::new(config, "graph").unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.snapshot.pages.len(), 5);
    assert_eq!(report.summary.total_pages_crawled, 5);

    let requested = requested_paths(&mock_server).await;
    assert_eq!(requested.len(), 5, "requested: {:?}", requested);
    let distinct: HashSet<&String> = requested.iter().collect();
    assert_eq!(distinct.len(), 5);
    assert_eq!(report.snapshot.visited.len(), 5);
}

#[tokio::test]
async fn test_limited_mode_respects_depth() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", links_page("Root", &["/d1".to_string()])).await;
    mount_page(&mock_server, "/d1", links_page("D1", &["/d2".to_string()])).await;
    mount_page(&mock_server, "/d2", links_page("D2", &["/d3".to_string()])).await;

    let config = create_test_config(&base_url, &dir, CrawlMode::Limited, 50);
    let report = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(report.summary.total_pages_crawled, 2);
    assert_eq!(report.summary.max_depth_reached, 1);

    let requested = requested_paths(&mock_server).await;
    assert!(requested.contains(&"/d1".to_string()));
    assert!(!requested.contains(&"/d2".to_string()));
}

#[tokio::test]
async fn test_ineligible_links_are_never_fetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    let hrefs: Vec<String> = [
        "/ok",
        "/admin/users",
        "/login",
        "/files/report.pdf",
        "/assets/logo.png",
        "https://elsewhere.example.org/page",
        "mailto:team@example.com",
        "javascript:void(0)",
        "/ok#section",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    mount_page(&mock_server, "/", links_page("Root", &hrefs)).await;
    mount_page(&mock_server, "/ok", links_page("Ok", &[])).await;

    let config = create_test_config(&base_url, &dir, CrawlMode::Exhaustive, 50);
    let report = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(report.summary.total_pages_crawled, 2);

    let mut requested = requested_paths(&mock_server).await;
    requested.sort();
    assert_eq!(requested, vec!["/", "/ok"]);
}

#[tokio::test]
async fn test_failed_pages_are_counted_and_listed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        links_page("Root", &["/gone".to_string(), "/here".to_string()]),
    )
    .await;
    mount_page(&mock_server, "/here", links_page("Here", &[])).await;

    let config = create_test_config(&base_url, &dir, CrawlMode::Exhaustive, 50);
    let report = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(report.summary.total_pages_crawled, 2);
    assert_eq!(report.summary.failed_urls, 1);
    assert_eq!(report.summary.unique_urls_visited, 3);
}

#[tokio::test]
async fn test_url_list_written_after_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        links_page("Root", &["/b".to_string(), "/a".to_string()]),
    )
    .await;
    mount_page(&mock_server, "/a", links_page("A", &[])).await;
    mount_page(&mock_server, "/b", links_page("B", &[])).await;

    let config = create_test_config(&base_url, &dir, CrawlMode::Exhaustive, 50);
    Coordinator::new(config, "cafebabe")
        .unwrap()
        .run()
        .await
        .unwrap();

    let list = UrlList::load(&dir.path().join("crawled_urls.json")).unwrap();
    let root = url::Url::parse(&base_url).unwrap();
    assert_eq!(list.base_url, base_url);
    assert_eq!(list.config_hash, "cafebabe");
    assert_eq!(list.total_urls_found, 3);
    assert_eq!(
        list.unique_urls,
        vec![
            root.to_string(),
            root.join("/a").unwrap().to_string(),
            root.join("/b").unwrap().to_string(),
        ]
    );
    assert!(list.dynamic_urls.is_empty());
    assert!(!list.crawl_timestamp.is_empty());
}
