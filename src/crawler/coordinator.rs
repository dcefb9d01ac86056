//! Crawler coordinator - wires a crawl together from its configuration
//!
//! This module:
//! - Builds the link policy for the seed's site domain
//! - Assembles the page source, optional renderer and discovery engine
//! - Seeds and runs the scheduler
//! - Writes the crawled URL list

use crate::browser::{ChromeRenderer, Renderer};
use crate::config::Config;
use crate::crawler::discovery::DiscoveryEngine;
use crate::crawler::fetcher::{HttpPageSource, HybridFetcher, PageSource};
use crate::crawler::scheduler::{CrawlReport, Scheduler, SchedulerSettings};
use crate::output::UrlList;
use crate::state::CrawlSession;
use crate::url::LinkPolicy;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    seed: Url,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP and, when the fetch mode
    /// calls for it, renders through headless Chrome
    pub fn new(config: Config, config_hash: impl Into<String>) -> crate::Result<Self> {
        let source = HttpPageSource::from_config(
            &config.user_agent,
            config.crawler.request_timeout(),
        )?;

        let renderer: Option<Arc<dyn Renderer>> = if config.crawler.renders() {
            Some(Arc::new(ChromeRenderer::new(
                config.browser.clone(),
                config.user_agent.header_value(),
            )))
        } else {
            None
        };

        Self::with_parts(config, config_hash, Arc::new(source), renderer)
    }

    /// Creates a coordinator over explicit fetch backends
    pub fn with_parts(
        config: Config,
        config_hash: impl Into<String>,
        source: Arc<dyn PageSource>,
        renderer: Option<Arc<dyn Renderer>>,
    ) -> crate::Result<Self> {
        let seed = Url::parse(&config.crawler.base_url)?;
        let policy = LinkPolicy::for_seed(&seed)?;

        tracing::info!(
            "Crawling {} (site domain {}, {:?} mode, {:?} fetch)",
            seed,
            policy.site_domain(),
            config.crawler.mode,
            config.crawler.fetch_mode
        );

        let mut fetcher = HybridFetcher::new(source, policy.clone(), config.crawler.fetch_mode);
        if let Some(renderer) = renderer {
            fetcher = fetcher.with_renderer(renderer);
            if config.crawler.dynamic_discovery {
                fetcher =
                    fetcher.with_discovery(DiscoveryEngine::new(policy, config.discovery.clone()));
            }
        }

        let session = Arc::new(CrawlSession::new(config.crawler.max_pages));
        let scheduler = Scheduler::new(
            Arc::new(fetcher),
            session,
            SchedulerSettings::from_config(&config.crawler),
        );

        Ok(Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            seed,
            scheduler,
        })
    }

    pub fn session(&self) -> &Arc<CrawlSession> {
        self.scheduler.session()
    }

    /// Runs the crawl to completion and writes the URL list
    pub async fn run(&self) -> crate::Result<CrawlReport> {
        if !self.scheduler.seed(self.seed.as_str()) {
            tracing::warn!("Seed {} was not queued", self.seed);
        }

        let report = self.scheduler.run().await;

        UrlList::from_snapshot(
            self.config.crawler.base_url.clone(),
            &report.snapshot,
            self.config_hash.clone(),
        )
        .write(Path::new(&self.config.output.urls_path))?;

        Ok(report)
    }
}

/// Runs a complete crawl operation
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded in the URL list
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished and the URL list was written
/// * `Err(StrataError)` - Setup failed or the URL list could not be written
pub async fn run_crawl(config: Config, config_hash: impl Into<String>) -> crate::Result<CrawlReport> {
    Coordinator::new(config, config_hash)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{MockElement, MockPage, MockRenderer};
    use crate::config::parse_config;
    use crate::crawler::fetcher::{FetchError, FetchedPage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Site(HashMap<String, String>);

    #[async_trait]
    impl PageSource for Site {
        async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
            match self.0.get(url) {
                Some(body) => Ok(FetchedPage {
                    final_url: url.to_string(),
                    status: 200,
                    content_type: "text/html".to_string(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn config(dir: &TempDir, fetch_mode: &str) -> Config {
        parse_config(&format!(
            r#"
[crawler]
base-url = "https://example.com/"
max-pages = 10
fetch-mode = "{}"

[discovery]
max-scroll-attempts = 0
scroll-into-view-settle-ms = 0
pagination-settle-ms = 0
click-settle-ms = 0
back-settle-ms = 0
scroll-settle-ms = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
urls-path = "{}"
output-dir = "{}"
"#,
            fetch_mode,
            dir.path().join("crawled_urls.json").display(),
            dir.path().join("out").display()
        ))
        .unwrap()
    }

    fn site() -> Arc<Site> {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            r#"<a href="/a">A</a><a href="https://elsewhere.org/">Out</a><a href="/file.pdf">PDF</a>"#
                .to_string(),
        );
        pages.insert("https://example.com/a".to_string(), r#"<a href="/">Home</a>"#.to_string());
        Arc::new(Site(pages))
    }

    #[tokio::test]
    async fn test_static_crawl_writes_url_list() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "static");

        let coordinator = Coordinator::with_parts(config, "hash123", site(), None).unwrap();
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.summary.total_pages_crawled, 2);
        let list = UrlList::load(&dir.path().join("crawled_urls.json")).unwrap();
        assert_eq!(list.unique_urls, vec!["https://example.com/", "https://example.com/a"]);
        assert_eq!(list.config_hash, "hash123");
        assert!(list.dynamic_urls.is_empty());
    }

    #[test]
    fn test_unparsable_seed_is_a_url_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, "static");
        config.crawler.base_url = "not a url".to_string();

        let result = Coordinator::with_parts(config, "", site(), None);
        assert!(matches!(result, Err(crate::StrataError::UrlParse(_))));
    }

    #[tokio::test]
    async fn test_rendered_crawl_records_dynamic_links() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "rendered");

        let page = MockPage::new(&["https://example.com/a"]).with_element(
            MockElement::new("button", "Load more").reveals(&["https://example.com/b"]),
        );
        let renderer: Arc<dyn Renderer> = Arc::new(MockRenderer {
            page: page.clone(),
            fail: false,
        });

        let coordinator =
            Coordinator::with_parts(config, "", site(), Some(renderer)).unwrap();
        let report = coordinator.run().await.unwrap();

        assert!(report.snapshot.dynamic.contains(&"https://example.com/b".to_string()));
        assert!(page.is_closed());
        let list = UrlList::load(&dir.path().join("crawled_urls.json")).unwrap();
        assert!(list.dynamic_urls.contains(&"https://example.com/b".to_string()));
    }
}
