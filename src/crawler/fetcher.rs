//! Page fetching for the crawl
//!
//! This module handles:
//! - Building HTTP clients with proper user agent strings
//! - Plain HTTP GETs through the [`PageSource`] seam
//! - Choosing between a plain fetch and a rendered session per URL
//! - Turning either into a [`PageRecord`] plus the links to follow
//!
//! A fetch never fails outward: every failure is logged and becomes an
//! outcome without a record.

use crate::browser::{RenderedSession, Renderer};
use crate::config::{FetchMode, UserAgentConfig};
use crate::crawler::discovery::DiscoveryEngine;
use crate::crawler::parser::parse_page;
use crate::crawler::record::{DiscoveryMethod, PageRecord};
use crate::url::LinkPolicy;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Path fragments of listing pages that usually hide links behind script
const DYNAMIC_PATH_HINTS: &[&str] = &[
    "/search",
    "/category",
    "/products",
    "/articles",
    "/news",
    "/blog",
];

const MAX_REDIRECTS: usize = 10;

/// Errors from a plain HTTP fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A successfully fetched HTTP response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Plain HTTP access to pages
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_strata::config::UserAgentConfig;
/// use sumi_strata::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiStrata".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageSource`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// What one fetch produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// None when every strategy failed
    pub record: Option<PageRecord>,

    /// Eligible links to enqueue, initial and dynamic together
    pub links: Vec<String>,

    /// Links revealed only by interaction
    pub dynamic_links: Vec<String>,
}

impl FetchOutcome {
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.record.is_some()
    }
}

/// Turns a URL into a page record and its outgoing links
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, depth: u32) -> FetchOutcome;
}

/// Fetcher that combines a plain HTTP source with an optional renderer
pub struct HybridFetcher {
    source: Arc<dyn PageSource>,
    renderer: Option<Arc<dyn Renderer>>,
    policy: LinkPolicy,
    fetch_mode: FetchMode,
    discovery: Option<DiscoveryEngine>,
}

impl HybridFetcher {
    pub fn new(source: Arc<dyn PageSource>, policy: LinkPolicy, fetch_mode: FetchMode) -> Self {
        Self {
            source,
            renderer: None,
            policy,
            fetch_mode,
            discovery: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Enables dynamic discovery on rendered pages
    pub fn with_discovery(mut self, engine: DiscoveryEngine) -> Self {
        self.discovery = Some(engine);
        self
    }

    /// Plain HTTP fetch and link extraction
    async fn fetch_static(&self, url: &str, depth: u32) -> Option<FetchOutcome> {
        let page = match self.source.get(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Static fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let base = Url::parse(&page.final_url)
            .or_else(|_| Url::parse(url))
            .ok()?;
        let parsed = parse_page(&page.body, &base);
        let links = dedupe(self.policy.retain_eligible(parsed.links));

        let record = PageRecord::new(
            url,
            parsed.title.unwrap_or_default(),
            depth,
            DiscoveryMethod::Static,
        )
        .with_links(&links, &[])
        .with_flags(parsed.has_pagination, parsed.has_dynamic_content);

        Some(FetchOutcome {
            record: Some(record),
            links,
            dynamic_links: Vec::new(),
        })
    }

    /// Rendered fetch, with discovery when enabled
    async fn fetch_rendered(&self, url: &str, depth: u32) -> Option<FetchOutcome> {
        let Some(renderer) = &self.renderer else {
            tracing::warn!("No renderer available for {}", url);
            return None;
        };

        let session = match renderer.open(url).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Rendered fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let outcome = self.inspect(session.as_ref(), url, depth).await;

        if let Err(e) = session.close().await {
            tracing::debug!("Failed to close rendered session for {}: {}", url, e);
        }

        outcome
    }

    async fn inspect(
        &self,
        session: &dyn RenderedSession,
        url: &str,
        depth: u32,
    ) -> Option<FetchOutcome> {
        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not read rendered content of {}: {}", url, e);
                return None;
            }
        };

        // Parse synchronously; the document must not live across an await
        let (title, has_pagination, has_dynamic_content) = {
            let base = Url::parse(url).ok()?;
            let parsed = parse_page(&html, &base);
            (
                parsed.title.unwrap_or_default(),
                parsed.has_pagination,
                parsed.has_dynamic_content,
            )
        };

        let (initial, dynamic) = match &self.discovery {
            Some(engine) => {
                let report = engine.discover(session, url).await;
                (report.baseline, report.links)
            }
            None => {
                let links = session.current_links().await.unwrap_or_else(|e| {
                    tracing::warn!("Could not read rendered links of {}: {}", url, e);
                    Vec::new()
                });
                (dedupe(self.policy.retain_eligible(links)), Vec::new())
            }
        };

        let method = if dynamic.is_empty() {
            DiscoveryMethod::Rendered
        } else {
            DiscoveryMethod::RenderedDynamic
        };

        let record = PageRecord::new(url, title, depth, method)
            .with_links(&initial, &dynamic)
            .with_flags(has_pagination, has_dynamic_content || !dynamic.is_empty());

        let links = dedupe(initial.into_iter().chain(dynamic.iter().cloned()).collect());

        Some(FetchOutcome {
            record: Some(record),
            links,
            dynamic_links: dynamic,
        })
    }

    fn wants_render(&self, url: &str) -> bool {
        if self.discovery.is_none() {
            return false;
        }
        let path = Url::parse(url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_default();
        DYNAMIC_PATH_HINTS.iter().any(|hint| path.contains(hint))
    }
}

#[async_trait]
impl PageFetcher for HybridFetcher {
    async fn fetch(&self, url: &str, depth: u32) -> FetchOutcome {
        let outcome = match self.fetch_mode {
            FetchMode::Static => self.fetch_static(url, depth).await,
            FetchMode::Rendered => self.fetch_rendered(url, depth).await,
            FetchMode::Auto => match self.fetch_static(url, depth).await {
                None => {
                    tracing::info!("Falling back to rendered fetch for {}", url);
                    self.fetch_rendered(url, depth).await
                }
                Some(plain) if self.wants_render(url) => {
                    match self.fetch_rendered(url, depth).await {
                        Some(rendered) => Some(rendered),
                        None => {
                            tracing::warn!("Keeping static result for {}", url);
                            Some(plain)
                        }
                    }
                }
                Some(plain) => Some(plain),
            },
        };

        outcome.unwrap_or_else(|| {
            tracing::error!("All fetch strategies failed for {}", url);
            FetchOutcome::failed()
        })
    }
}

fn dedupe(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
