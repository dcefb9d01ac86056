//! Extraction pipeline
//!
//! Takes the URL list written by a crawl and, for every page, fetches the
//! HTML, decomposes it into components, runs every analysis pass and writes
//! the page directory. Pages whose directory is already complete are skipped
//! without a fetch, so an interrupted run can simply be started again.

use crate::analysis::PageAnalyzer;
use crate::components;
use crate::config::Config;
use crate::crawler::{FetchedPage, HttpPageSource, PageSource};
use crate::output::{ExtractionTotals, PageArtifacts, PageWriter, RunSummary, UrlList};
use crate::url::page_identifier;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Completions between two progress lines
const PROGRESS_EVERY: usize = 10;

/// What happened to one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Written in this run, with the number of components extracted
    Extracted { components: usize },
    /// Already complete on disk
    Skipped,
    Failed,
}

/// Runs extraction over URL lists
pub struct Extractor {
    source: Arc<dyn PageSource>,
    writer: PageWriter,
    analyzer: Arc<PageAnalyzer>,
    workers: usize,
}

impl Extractor {
    pub fn new(source: Arc<dyn PageSource>, writer: PageWriter, workers: usize) -> Self {
        Self {
            source,
            writer,
            analyzer: Arc::new(PageAnalyzer::new()),
            workers: workers.max(1),
        }
    }

    pub fn with_analyzer(mut self, analyzer: PageAnalyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    /// Extractor over plain HTTP, using the `[output]` settings
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let source = HttpPageSource::from_config(
            &config.user_agent,
            Duration::from_secs(config.output.extract_timeout),
        )?;

        Ok(Self::new(
            Arc::new(source),
            PageWriter::new(&config.output.output_dir),
            config.output.extract_workers,
        ))
    }

    pub fn writer(&self) -> &PageWriter {
        &self.writer
    }

    /// Extracts every page of a list and writes the run summary
    pub async fn run(&self, list: &UrlList) -> crate::Result<ExtractionTotals> {
        let targets = list.targets();
        let mut totals = ExtractionTotals {
            total_urls: targets.len(),
            dynamic_urls: targets.iter().filter(|(_, dynamic)| *dynamic).count(),
            ..Default::default()
        };

        std::fs::create_dir_all(self.writer.root())?;

        tracing::info!(
            "Starting extraction of {} URLs with {} workers ({} dynamic, {} static)",
            totals.total_urls,
            self.workers,
            totals.dynamic_urls,
            totals.total_urls - totals.dynamic_urls
        );

        let mut outcomes = stream::iter(targets)
            .map(|(url, is_dynamic)| async move { self.extract_page(&url, is_dynamic).await })
            .buffer_unordered(self.workers);

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                PageOutcome::Extracted { components } => {
                    totals.extracted += 1;
                    totals.components += components;
                }
                PageOutcome::Skipped => totals.skipped += 1,
                PageOutcome::Failed => totals.failed += 1,
            }

            if totals.finished() % PROGRESS_EVERY == 0 {
                tracing::info!(
                    "Progress: {} success, {} failed, {} remaining",
                    totals.successful(),
                    totals.failed,
                    totals.remaining()
                );
            }
        }

        RunSummary::new(&totals, &self.analyzer.strategy_names()).write(self.writer.root())?;

        tracing::info!(
            "Extraction complete: {} extracted, {} skipped, {} failed",
            totals.extracted,
            totals.skipped,
            totals.failed
        );

        Ok(totals)
    }

    /// Extracts one page; never returns an error, failures are logged
    pub async fn extract_page(&self, url: &str, is_dynamic: bool) -> PageOutcome {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Skipping unparsable URL {}: {}", url, e);
                return PageOutcome::Failed;
            }
        };
        let identifier = page_identifier(&parsed);

        if self.writer.is_complete(&identifier) {
            tracing::info!("Skipping {} - already processed", url);
            return PageOutcome::Skipped;
        }

        let page = match self.source.get(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Error fetching {} for extraction: {}", url, e);
                return PageOutcome::Failed;
            }
        };

        let writer = self.writer.clone();
        let analyzer = Arc::clone(&self.analyzer);
        let task_url = url.to_string();
        let task_identifier = identifier.clone();
        let written = tokio::task::spawn_blocking(move || {
            let artifacts = build_artifacts(&analyzer, task_url, parsed, is_dynamic, page);
            writer.write(&task_identifier, &artifacts)
        })
        .await;

        match written {
            Ok(Ok(components)) => {
                tracing::info!(
                    "Analyzed: {} -> {}{}",
                    url,
                    identifier,
                    if is_dynamic { " (dynamic)" } else { "" }
                );
                PageOutcome::Extracted { components }
            }
            Ok(Err(e)) => {
                tracing::error!("Error writing artifacts for {}: {}", url, e);
                PageOutcome::Failed
            }
            Err(e) => {
                tracing::error!("Extraction task for {} failed: {}", url, e);
                PageOutcome::Failed
            }
        }
    }
}

/// Parses, classifies and analyzes a fetched page
fn build_artifacts(
    analyzer: &PageAnalyzer,
    url: String,
    parsed: Url,
    is_dynamic: bool,
    page: FetchedPage,
) -> PageArtifacts {
    let document = Html::parse_document(&page.body);
    let components = components::classify(&document);
    let analyses = analyzer.analyze(&document, &parsed);

    PageArtifacts {
        url,
        is_dynamic,
        status: page.status,
        content_type: page.content_type,
        html: page.body,
        components,
        analyses,
    }
}

/// Loads the URL list named in the configuration and extracts it
pub async fn run_extraction(config: &Config) -> crate::Result<ExtractionTotals> {
    let list = UrlList::load(Path::new(&config.output.urls_path))?;
    tracing::info!(
        "Loaded {} URLs ({} dynamic) from {}",
        list.unique_urls.len(),
        list.dynamic_urls.len(),
        config.output.urls_path
    );

    Extractor::from_config(config)?.run(&list).await
}
