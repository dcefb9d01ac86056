//! Crawl statistics
//!
//! This module derives the end-of-crawl summary from a session snapshot
//! and prints it to stdout.

use crate::state::SessionSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Pages with a successful record
    pub total_pages_crawled: usize,

    /// Sum of the distinct eligible links of every page
    pub total_links_found: usize,

    /// URLs revealed only by dynamic discovery
    pub dynamic_urls_discovered: usize,

    /// Pages where interaction revealed at least one new link
    pub pages_with_dynamic_content: usize,

    pub max_depth_reached: u32,

    /// Every URL dispatched, including failed ones
    pub unique_urls_visited: usize,

    pub failed_urls: usize,

    /// Number of pages per discovery method
    pub methods_used: BTreeMap<String, usize>,

    pub elapsed_secs: f64,
}

impl CrawlSummary {
    pub fn from_snapshot(snapshot: &SessionSnapshot, elapsed: Duration) -> Self {
        let mut methods_used = BTreeMap::new();
        for page in &snapshot.pages {
            *methods_used.entry(page.method.to_string()).or_insert(0) += 1;
        }

        Self {
            total_pages_crawled: snapshot.pages.len(),
            total_links_found: snapshot.pages.iter().map(|p| p.links_found).sum(),
            dynamic_urls_discovered: snapshot.dynamic.len(),
            pages_with_dynamic_content: snapshot
                .pages
                .iter()
                .filter(|p| p.dynamic_links > 0)
                .count(),
            max_depth_reached: snapshot.pages.iter().map(|p| p.depth).max().unwrap_or(0),
            unique_urls_visited: snapshot.visited.len(),
            failed_urls: snapshot.failed.len(),
            methods_used,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Share of dispatched URLs that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.unique_urls_visited > 0 {
            (self.total_pages_crawled as f64 / self.unique_urls_visited as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", summary.total_pages_crawled);
    println!("  Unique URLs visited: {}", summary.unique_urls_visited);
    println!("  Total links found: {}", summary.total_links_found);
    println!("  Max depth reached: {}", summary.max_depth_reached);
    println!("  Elapsed: {:.1}s", summary.elapsed_secs);
    println!();

    println!("Dynamic Discovery:");
    println!("  Dynamic URLs discovered: {}", summary.dynamic_urls_discovered);
    println!(
        "  Pages with dynamic content: {}",
        summary.pages_with_dynamic_content
    );
    println!();

    if !summary.methods_used.is_empty() {
        println!("Methods Used:");
        let mut methods: Vec<_> = summary.methods_used.iter().collect();
        methods.sort_by(|a, b| b.1.cmp(a.1));

        for (method, count) in methods {
            println!("  {}: {}", method, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} URLs, {} failed)",
        summary.success_rate(),
        summary.total_pages_crawled,
        summary.unique_urls_visited,
        summary.failed_urls
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DiscoveryMethod, PageRecord};

    fn page(url: &str, depth: u32, method: DiscoveryMethod, dynamic: &[String]) -> PageRecord {
        let initial = vec![format!("{}/child", url)];
        PageRecord::new(url, "", depth, method).with_links(&initial, dynamic)
    }

    #[test]
    fn test_summary_from_snapshot() {
        let snapshot = SessionSnapshot {
            pages: vec![
                page("https://example.com", 0, DiscoveryMethod::RenderedDynamic, &[
                    "https://example.com/p2".to_string(),
                ]),
                page("https://example.com/a", 1, DiscoveryMethod::Static, &[]),
                page("https://example.com/b", 2, DiscoveryMethod::Static, &[]),
            ],
            visited: vec![
                "https://example.com".to_string(),
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
                "https://example.com/dead".to_string(),
            ],
            dynamic: vec!["https://example.com/p2".to_string()],
            failed: vec!["https://example.com/dead".to_string()],
            discovered: 5,
        };

        let summary = CrawlSummary::from_snapshot(&snapshot, Duration::from_millis(1500));

        assert_eq!(summary.total_pages_crawled, 3);
        assert_eq!(summary.total_links_found, 4);
        assert_eq!(summary.dynamic_urls_discovered, 1);
        assert_eq!(summary.pages_with_dynamic_content, 1);
        assert_eq!(summary.max_depth_reached, 2);
        assert_eq!(summary.unique_urls_visited, 4);
        assert_eq!(summary.failed_urls, 1);
        assert_eq!(summary.methods_used.get("static"), Some(&2));
        assert_eq!(summary.methods_used.get("rendered_dynamic"), Some(&1));
        assert_eq!(summary.elapsed_secs, 1.5);
        assert_eq!(summary.success_rate(), 75.0);
    }

    #[test]
    fn test_empty_snapshot() {
        let summary = CrawlSummary::from_snapshot(&SessionSnapshot::default(), Duration::ZERO);
        assert_eq!(summary.max_depth_reached, 0);
        assert_eq!(summary.success_rate(), 0.0);
        assert!(summary.methods_used.is_empty());
    }
}
