//! The crawl session aggregate
//!
//! Everything the workers of one crawl share lives behind a single mutex:
//! the frontier, the visited set, per-URL dispatch states, the page records,
//! and the discovered and dynamic link sets. The lock is held only for
//! bookkeeping and is never held across a fetch.

use crate::crawler::PageRecord;
use crate::state::DispatchState;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A URL waiting in the frontier together with the depth it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// Point-in-time copy of a session's results
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Successful page records in completion order
    pub pages: Vec<PageRecord>,

    /// Every URL ever dispatched, sorted
    pub visited: Vec<String>,

    /// URLs revealed only by dynamic discovery, sorted
    pub dynamic: Vec<String>,

    /// URLs for which every fetch path failed, in failure order
    pub failed: Vec<String>,

    /// Distinct eligible links seen across all pages
    pub discovered: usize,
}

#[derive(Debug, Default)]
struct SessionInner {
    frontier: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    states: HashMap<String, DispatchState>,
    pages: Vec<PageRecord>,
    discovered: HashSet<String>,
    dynamic: HashSet<String>,
    failed: Vec<String>,
}

impl SessionInner {
    fn transition(&mut self, url: &str, next: DispatchState) {
        let current = self.states.get(url).copied();
        match current {
            Some(state) if state.can_transition_to(next) => {
                self.states.insert(url.to_string(), next);
            }
            None if next == DispatchState::Pending => {
                self.states.insert(url.to_string(), next);
            }
            _ => {
                tracing::warn!(
                    "Ignoring illegal state change for {}: {:?} -> {}",
                    url,
                    current,
                    next
                );
            }
        }
    }
}

/// Shared state of one crawl
#[derive(Debug)]
pub struct CrawlSession {
    max_pages: usize,
    inner: Mutex<SessionInner>,
}

impl CrawlSession {
    /// Creates an empty session that stops after `max_pages` successful pages
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Workers only do bookkeeping under the lock, so a panic there leaves
    /// the sets consistent enough to keep going.
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Adds a URL to the back of the frontier
    ///
    /// Returns false without changing anything when the URL was already
    /// visited or queued, or when the page ceiling has been reached.
    pub fn enqueue(&self, url: &str, depth: u32) -> bool {
        let mut inner = self.lock();

        if inner.pages.len() >= self.max_pages
            || inner.visited.contains(url)
            || inner.queued.contains(url)
        {
            return false;
        }

        inner.queued.insert(url.to_string());
        inner.frontier.push_back(FrontierEntry {
            url: url.to_string(),
            depth,
        });
        inner.transition(url, DispatchState::Pending);
        true
    }

    /// Draws the next batch in FIFO order and marks every entry dispatched
    ///
    /// The batch never holds more entries than the page budget has left.
    /// Entries are added to the visited set here, so a URL is dispatched at
    /// most once per session whatever its outcome.
    pub fn draw_batch(&self, batch_size: usize) -> Vec<FrontierEntry> {
        let mut inner = self.lock();
        let remaining = self.max_pages.saturating_sub(inner.pages.len());
        let limit = batch_size.min(remaining);

        let mut batch = Vec::with_capacity(limit);
        while batch.len() < limit {
            let Some(entry) = inner.frontier.pop_front() else {
                break;
            };
            inner.queued.remove(&entry.url);
            if !inner.visited.insert(entry.url.clone()) {
                continue;
            }
            inner.transition(&entry.url, DispatchState::Dispatched);
            batch.push(entry);
        }

        batch
    }

    /// Records a successful fetch along with the links it produced
    pub fn record_success(&self, record: PageRecord, links: &[String], dynamic_links: &[String]) {
        let mut inner = self.lock();
        let url = record.url.clone();

        inner.discovered.extend(links.iter().cloned());
        inner.dynamic.extend(dynamic_links.iter().cloned());

        if inner.pages.len() < self.max_pages {
            inner.pages.push(record);
        } else {
            tracing::debug!("Page ceiling reached, dropping record for {}", url);
        }
        inner.transition(&url, DispatchState::Succeeded);
    }

    /// Records that every fetch path failed for a URL
    pub fn record_failure(&self, url: &str) {
        let mut inner = self.lock();
        inner.failed.push(url.to_string());
        inner.transition(url, DispatchState::Failed);
    }

    /// True when the frontier is empty or the page ceiling has been reached
    pub fn is_finished(&self) -> bool {
        let inner = self.lock();
        inner.frontier.is_empty() || inner.pages.len() >= self.max_pages
    }

    pub fn page_count(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.lock().frontier.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.lock().dynamic.len()
    }

    pub fn has_visited(&self, url: &str) -> bool {
        self.lock().visited.contains(url)
    }

    pub fn state_of(&self, url: &str) -> Option<DispatchState> {
        self.lock().states.get(url).copied()
    }

    /// Copies the results out of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            pages: inner.pages.clone(),
            visited: inner.visited.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect(),
            dynamic: inner.dynamic.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect(),
            failed: inner.failed.clone(),
            discovered: inner.discovered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DiscoveryMethod, PageRecord};

    fn record(url: &str) -> PageRecord {
        PageRecord::new(url, "Title", 0, DiscoveryMethod::Static)
    }

    #[test]
    fn test_enqueue_deduplicates() {
        let session = CrawlSession::new(10);
        assert!(session.enqueue("https://example.com/", 0));
        assert!(!session.enqueue("https://example.com/", 1));
        assert_eq!(session.frontier_len(), 1);
        assert_eq!(session.state_of("https://example.com/"), Some(DispatchState::Pending));
    }

    #[test]
    fn test_draw_batch_is_fifo_and_bounded() {
        let session = CrawlSession::new(10);
        for i in 0..5 {
            session.enqueue(&format!("https://example.com/{}", i), 1);
        }

        let batch = session.draw_batch(3);
        let urls: Vec<_> = batch.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/0", "https://example.com/1", "https://example.com/2"]
        );
        assert_eq!(session.frontier_len(), 2);
        assert_eq!(
            session.state_of("https://example.com/0"),
            Some(DispatchState::Dispatched)
        );
    }

    #[test]
    fn test_batch_capped_by_remaining_budget() {
        let session = CrawlSession::new(2);
        for i in 0..5 {
            session.enqueue(&format!("https://example.com/{}", i), 1);
        }
        let first = session.draw_batch(3);
        assert_eq!(first.len(), 2);

        session.record_success(record(&first[0].url), &[], &[]);
        session.record_success(record(&first[1].url), &[], &[]);
        assert!(session.draw_batch(3).is_empty());
        assert!(session.is_finished());
    }

    #[test]
    fn test_visited_is_monotonic() {
        let session = CrawlSession::new(10);
        session.enqueue("https://example.com/a", 0);
        let batch = session.draw_batch(1);
        session.record_failure(&batch[0].url);

        assert!(session.has_visited("https://example.com/a"));
        assert!(!session.enqueue("https://example.com/a", 2));
        assert_eq!(session.state_of("https://example.com/a"), Some(DispatchState::Failed));
        assert_eq!(session.snapshot().failed, vec!["https://example.com/a"]);
    }

    #[test]
    fn test_no_enqueue_after_ceiling() {
        let session = CrawlSession::new(1);
        session.enqueue("https://example.com/", 0);
        let batch = session.draw_batch(3);
        session.record_success(record(&batch[0].url), &[], &[]);

        assert!(!session.enqueue("https://example.com/more", 1));
        assert_eq!(session.page_count(), 1);
    }

    #[test]
    fn test_snapshot_sorted_sets() {
        let session = CrawlSession::new(10);
        session.enqueue("https://example.com/b", 0);
        session.enqueue("https://example.com/a", 0);
        let batch = session.draw_batch(2);
        for entry in &batch {
            session.record_success(
                record(&entry.url),
                &["https://example.com/z".to_string(), "https://example.com/y".to_string()],
                &["https://example.com/z".to_string()],
            );
        }

        let snapshot = session.snapshot();
        assert_eq!(snapshot.visited, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(snapshot.dynamic, vec!["https://example.com/z"]);
        assert_eq!(snapshot.discovered, 2);
        assert_eq!(snapshot.pages.len(), 2);
    }
}
