//! Crawler module for single-site discovery
//!
//! This module contains the core crawling logic, including:
//! - Plain HTTP fetching with a rendered fallback
//! - HTML parsing and link extraction
//! - Dynamic discovery on rendered pages (pagination, load-more, scroll)
//! - Batch scheduling over the crawl frontier
//! - Overall crawl coordination

mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod record;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use discovery::{DiscoveryEngine, DiscoveryPhase, DiscoveryReport, DiscoveryStep};
pub use fetcher::{
    build_http_client, FetchError, FetchOutcome, FetchedPage, HttpPageSource, HybridFetcher,
    PageFetcher, PageSource,
};
pub use parser::{parse_page, resolve_link, strip_fragment, ParsedPage};
pub use record::{DiscoveryMethod, PageRecord, RENDERED_LINK_SAMPLE, STATIC_LINK_SAMPLE};
pub use scheduler::{CrawlReport, Scheduler, SchedulerSettings};
