use serde::Deserialize;
use std::time::Duration;

/// Nominal depth used in exhaustive mode, large enough to never be reached
pub const EXHAUSTIVE_MAX_DEPTH: u32 = 999;

/// Main configuration structure for Sumi-Strata
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// How far the crawl is allowed to go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Ignore depth, stop only on frontier exhaustion or the page ceiling
    Exhaustive,
    /// Respect `max-depth`
    Limited,
}

/// Which fetch path the crawler takes for each page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP only
    Static,
    /// Plain HTTP first, render on failure or when the URL looks script-driven
    Auto,
    /// Render every page
    Rendered,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URL; its network location is the crawl's site domain
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(default = "default_mode")]
    pub mode: CrawlMode,

    /// Ceiling on successfully crawled pages
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum depth in limited mode
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(rename = "fetch-mode", default = "default_fetch_mode")]
    pub fetch_mode: FetchMode,

    /// Click pagination / load-more controls and scroll on rendered pages
    #[serde(rename = "dynamic-discovery", default = "default_true")]
    pub dynamic_discovery: bool,

    /// Frontier entries drawn per dispatch batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Worker pool size for static crawls
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Worker pool size while rendered sessions are in play
    #[serde(rename = "dynamic-workers", default = "default_dynamic_workers")]
    pub dynamic_workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl CrawlerConfig {
    /// Depth limit actually applied by the scheduler
    pub fn effective_max_depth(&self) -> u32 {
        match self.mode {
            CrawlMode::Exhaustive => EXHAUSTIVE_MAX_DEPTH,
            CrawlMode::Limited => self.max_depth,
        }
    }

    /// Whether any page may go through a rendered session
    pub fn renders(&self) -> bool {
        match self.fetch_mode {
            FetchMode::Static => false,
            FetchMode::Auto => self.dynamic_discovery,
            FetchMode::Rendered => true,
        }
    }

    /// Worker pool size for the configured fetch mode
    pub fn pool_size(&self) -> usize {
        if self.renders() {
            self.dynamic_workers
        } else {
            self.workers
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Dynamic discovery budgets and settle times
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    #[serde(rename = "max-pagination-clicks")]
    pub max_pagination_clicks: usize,

    /// Shared click budget for the generic-interaction phase
    #[serde(rename = "max-interactions")]
    pub max_interactions: usize,

    /// Extra clicks on a next/more/load control while it keeps yielding links
    #[serde(rename = "max-repeat-clicks")]
    pub max_repeat_clicks: usize,

    #[serde(rename = "max-scroll-attempts")]
    pub max_scroll_attempts: usize,

    #[serde(rename = "scroll-into-view-settle-ms")]
    pub scroll_into_view_settle_ms: u64,

    #[serde(rename = "pagination-settle-ms")]
    pub pagination_settle_ms: u64,

    #[serde(rename = "click-settle-ms")]
    pub click_settle_ms: u64,

    #[serde(rename = "back-settle-ms")]
    pub back_settle_ms: u64,

    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pagination_clicks: 10,
            max_interactions: 10,
            max_repeat_clicks: 3,
            max_scroll_attempts: 5,
            scroll_into_view_settle_ms: 1000,
            pagination_settle_ms: 3000,
            click_settle_ms: 2000,
            back_settle_ms: 2000,
            scroll_settle_ms: 2000,
        }
    }
}

impl DiscoveryConfig {
    /// Same budgets with every settle wait removed
    pub fn without_waits(mut self) -> Self {
        self.scroll_into_view_settle_ms = 0;
        self.pagination_settle_ms = 0;
        self.click_settle_ms = 0;
        self.back_settle_ms = 0;
        self.scroll_settle_ms = 0;
        self
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Explicit Chrome/Chromium binary; auto-detected when absent
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<String>,

    /// Seconds allowed for the initial navigation of a rendered session
    #[serde(rename = "page-load-timeout")]
    pub page_load_timeout: u64,

    /// Wait after navigation before the DOM is read
    #[serde(rename = "initial-settle-ms")]
    pub initial_settle_ms: u64,

    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            page_load_timeout: 15,
            initial_settle_ms: 1000,
            headless: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// URL list written by the crawl and read by extraction
    #[serde(rename = "urls-path")]
    pub urls_path: String,

    /// Root of the per-page artifact directories
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    #[serde(rename = "extract-workers", default = "default_extract_workers")]
    pub extract_workers: usize,

    /// Per-request timeout for extraction fetches, in seconds
    #[serde(rename = "extract-timeout", default = "default_extract_timeout")]
    pub extract_timeout: u64,
}

fn default_mode() -> CrawlMode {
    CrawlMode::Exhaustive
}

fn default_max_depth() -> u32 {
    3
}

fn default_fetch_mode() -> FetchMode {
    FetchMode::Auto
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    3
}

fn default_workers() -> usize {
    3
}

fn default_dynamic_workers() -> usize {
    2
}

fn default_request_timeout() -> u64 {
    10
}

fn default_extract_workers() -> usize {
    4
}

fn default_extract_timeout() -> u64 {
    15
}
