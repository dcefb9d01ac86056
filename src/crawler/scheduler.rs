//! Batch scheduler over the crawl frontier
//!
//! This module handles:
//! - Drawing FIFO batches from the session, capped by the remaining page budget
//! - Dispatching each batch to a bounded worker pool
//! - Joining the batch before the next one is drawn
//! - Enqueuing children according to the crawl mode and depth

use crate::config::{CrawlMode, CrawlerConfig};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::output::CrawlSummary;
use crate::state::{CrawlSession, FrontierEntry, SessionSnapshot};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Pages between two progress lines
const PROGRESS_EVERY: usize = 10;

/// Results of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub snapshot: SessionSnapshot,
    pub summary: CrawlSummary,
}

/// Knobs the scheduler needs from the crawler configuration
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub batch_size: usize,
    pub pool_size: usize,
    pub mode: CrawlMode,
    pub max_depth: u32,
}

impl SchedulerSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            pool_size: config.pool_size(),
            mode: config.mode,
            max_depth: config.effective_max_depth(),
        }
    }

    /// Whether links found at `depth` are followed
    pub fn follows_children(&self, depth: u32) -> bool {
        match self.mode {
            CrawlMode::Exhaustive => true,
            CrawlMode::Limited => depth < self.max_depth,
        }
    }
}

/// Drives a [`CrawlSession`] to completion
pub struct Scheduler {
    fetcher: Arc<dyn PageFetcher>,
    session: Arc<CrawlSession>,
    semaphore: Arc<Semaphore>,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        session: Arc<CrawlSession>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            fetcher,
            session,
            semaphore: Arc::new(Semaphore::new(settings.pool_size.max(1))),
            settings,
        }
    }

    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    /// Puts the start URL into the frontier at depth 0
    pub fn seed(&self, url: &str) -> bool {
        self.session.enqueue(url, 0)
    }

    /// Runs batches until the frontier is empty or the page ceiling is hit
    pub async fn run(&self) -> CrawlReport {
        let started = Instant::now();
        let mut last_progress = 0;

        tracing::info!(
            "Starting crawl (max pages {}, batch size {}, {} workers)",
            self.session.max_pages(),
            self.settings.batch_size,
            self.settings.pool_size
        );

        while !self.session.is_finished() {
            let batch = self.session.draw_batch(self.settings.batch_size);
            if batch.is_empty() {
                break;
            }
            tracing::debug!("Dispatching batch of {} URLs", batch.len());

            let mut tasks = JoinSet::new();
            for entry in batch {
                let fetcher = Arc::clone(&self.fetcher);
                let semaphore = Arc::clone(&self.semaphore);
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = AssertUnwindSafe(fetcher.fetch(&entry.url, entry.depth))
                        .catch_unwind()
                        .await;
                    (entry, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((entry, Ok(outcome))) => self.absorb(entry, outcome),
                    Ok((entry, Err(_))) => {
                        tracing::error!("Fetch of {} panicked", entry.url);
                        self.session.record_failure(&entry.url);
                    }
                    Err(e) => tracing::error!("Crawl worker failed: {}", e),
                }

                let pages = self.session.page_count();
                if pages >= last_progress + PROGRESS_EVERY {
                    last_progress = pages - pages % PROGRESS_EVERY;
                    tracing::info!(
                        "Progress: {} pages crawled, {} in queue, {} dynamic URLs found",
                        pages,
                        self.session.frontier_len(),
                        self.session.dynamic_count()
                    );
                }
            }
        }

        let snapshot = self.session.snapshot();
        let summary = CrawlSummary::from_snapshot(&snapshot, started.elapsed());

        tracing::info!(
            "Crawl finished: {} pages, {} failed, {} dynamic URLs",
            summary.total_pages_crawled,
            summary.failed_urls,
            summary.dynamic_urls_discovered
        );

        CrawlReport { snapshot, summary }
    }

    fn absorb(&self, entry: FrontierEntry, outcome: FetchOutcome) {
        let Some(record) = outcome.record else {
            tracing::warn!("Failed to crawl {} at depth {}", entry.url, entry.depth);
            self.session.record_failure(&entry.url);
            return;
        };

        tracing::info!(
            "Crawled: {} (depth {}, {} links, {})",
            record.url,
            record.depth,
            record.links_found,
            record.method
        );

        self.session
            .record_success(record, &outcome.links, &outcome.dynamic_links);

        if !self.settings.follows_children(entry.depth) {
            return;
        }

        let mut added = 0;
        for link in &outcome.links {
            if self.session.enqueue(link, entry.depth + 1) {
                added += 1;
            }
        }
        tracing::trace!("Queued {} new URLs from {}", added, entry.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::record::{DiscoveryMethod, PageRecord};
    use crate::state::DispatchState;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fetcher over an in-memory link graph
    #[derive(Default)]
    struct GraphFetcher {
        graph: HashMap<String, Vec<String>>,
        fetched: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GraphFetcher {
        fn complete(n: usize) -> Self {
            let nodes: Vec<String> = (0..n).map(node).collect();
            let graph = nodes
                .iter()
                .map(|from| {
                    let links = nodes.iter().filter(|to| *to != from).cloned().collect();
                    (from.clone(), links)
                })
                .collect();
            Self {
                graph,
                ..Self::default()
            }
        }

        fn chain(n: usize) -> Self {
            let graph = (0..n)
                .map(|i| {
                    let links = if i + 1 < n { vec![node(i + 1)] } else { vec![] };
                    (node(i), links)
                })
                .collect();
            Self {
                graph,
                ..Self::default()
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    fn node(i: usize) -> String {
        if i == 0 {
            "https://graph.test/".to_string()
        } else {
            format!("https://graph.test/n{}", i)
        }
    }

    #[async_trait]
    impl PageFetcher for GraphFetcher {
        async fn fetch(&self, url: &str, depth: u32) -> FetchOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.fetched.lock().unwrap().push(url.to_string());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.ends_with("/panic") {
                panic!("boom");
            }

            match self.graph.get(url) {
                Some(links) => FetchOutcome {
                    record: Some(
                        PageRecord::new(url, "Node", depth, DiscoveryMethod::Static)
                            .with_links(links, &[]),
                    ),
                    links: links.clone(),
                    dynamic_links: Vec::new(),
                },
                None => FetchOutcome::failed(),
            }
        }
    }

    fn settings(mode: CrawlMode, max_depth: u32) -> SchedulerSettings {
        SchedulerSettings {
            batch_size: 3,
            pool_size: 3,
            mode,
            max_depth,
        }
    }

    async fn crawl(
        fetcher: Arc<GraphFetcher>,
        max_pages: usize,
        settings: SchedulerSettings,
    ) -> CrawlReport {
        let session = Arc::new(CrawlSession::new(max_pages));
        let scheduler = Scheduler::new(fetcher, session, settings);
        scheduler.seed(&node(0));
        scheduler.run().await
    }

    #[tokio::test]
    async fn test_complete_graph_stops_at_page_ceiling() {
        let fetcher = Arc::new(GraphFetcher::complete(20));
        let report = crawl(fetcher.clone(), 5, settings(CrawlMode::Exhaustive, 999)).await;

        assert_eq!(report.snapshot.pages.len(), 5);
        assert_eq!(fetcher.fetched().len(), 5);
        assert_eq!(report.snapshot.visited.len(), 5);
        assert_eq!(report.summary.total_pages_crawled, 5);
    }

    #[tokio::test]
    async fn test_every_url_fetched_at_most_once() {
        let fetcher = Arc::new(GraphFetcher::complete(8));
        let report = crawl(fetcher.clone(), 100, settings(CrawlMode::Exhaustive, 999)).await;

        let mut fetched = fetcher.fetched();
        let total = fetched.len();
        fetched.sort();
        fetched.dedup();
        assert_eq!(fetched.len(), total);
        assert_eq!(report.snapshot.pages.len(), 8);
    }

    #[tokio::test]
    async fn test_limited_mode_respects_max_depth() {
        let fetcher = Arc::new(GraphFetcher::chain(6));
        let report = crawl(fetcher.clone(), 100, settings(CrawlMode::Limited, 2)).await;

        // depths 0, 1 and 2 are crawled, children of depth 2 are not queued
        assert_eq!(report.snapshot.pages.len(), 3);
        assert_eq!(report.summary.max_depth_reached, 2);
        assert!(!fetcher.fetched().contains(&node(3)));
    }

    #[tokio::test]
    async fn test_exhaustive_mode_ignores_depth() {
        let fetcher = Arc::new(GraphFetcher::chain(6));
        let report = crawl(fetcher, 100, settings(CrawlMode::Exhaustive, 1)).await;

        assert_eq!(report.snapshot.pages.len(), 6);
    }

    #[tokio::test]
    async fn test_failures_recorded_and_crawl_continues() {
        let mut fetcher = GraphFetcher::chain(2);
        fetcher.graph.insert(
            node(0),
            vec![
                node(1),
                "https://graph.test/missing".to_string(),
                "https://graph.test/panic".to_string(),
            ],
        );
        let fetcher = Arc::new(fetcher);
        let session = Arc::new(CrawlSession::new(100));
        let scheduler = Scheduler::new(
            fetcher,
            Arc::clone(&session),
            settings(CrawlMode::Exhaustive, 999),
        );
        scheduler.seed(&node(0));

        let report = scheduler.run().await;

        assert_eq!(report.snapshot.pages.len(), 2);
        assert_eq!(report.snapshot.failed.len(), 2);
        assert_eq!(
            session.state_of("https://graph.test/panic"),
            Some(DispatchState::Failed)
        );
        assert_eq!(session.state_of(&node(1)), Some(DispatchState::Succeeded));
    }

    #[tokio::test]
    async fn test_worker_pool_bounds_concurrency() {
        let fetcher = Arc::new(GraphFetcher::complete(12));
        let mut narrow = settings(CrawlMode::Exhaustive, 999);
        narrow.batch_size = 10;
        narrow.pool_size = 2;

        crawl(fetcher.clone(), 100, narrow).await;

        assert!(fetcher.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_follows_children() {
        let limited = settings(CrawlMode::Limited, 2);
        assert!(limited.follows_children(1));
        assert!(!limited.follows_children(2));
        assert!(settings(CrawlMode::Exhaustive, 0).follows_children(50));
    }
}
