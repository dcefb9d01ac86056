//! Dynamic discovery on rendered pages
//!
//! Some sites only reveal part of their link graph after script runs:
//! numbered pagination that swaps a card grid in place, "load more"
//! buttons, infinite scroll. The engine drives a rendered session through
//! three phases and attributes to each step only the links that no earlier
//! step (and not the initial DOM) had already shown.

use crate::browser::{BrowserError, ElementHandle, RenderedSession};
use crate::config::DiscoveryConfig;
use crate::crawler::parser::strip_fragment;
use crate::url::LinkPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

const PAGINATION_SELECTOR: &str = "a, button, [onclick]";
const INTERACTION_SELECTOR: &str = "a, button, [onclick], [data-toggle]";

const PAGE_CLASS_HINTS: &[&str] = &["page", "pagination", "pager"];
const INTERACTION_TEXT_HINTS: &[&str] = &["next", "previous", "prev", "more", "load"];
const INTERACTION_CLASS_HINTS: &[&str] = &["next", "prev", "more", "load", "pagination", "pager"];

/// Labels whose control is worth pressing again while it keeps paying off
const REPEAT_HINTS: &[&str] = &["next", "more", "load"];

const MAX_LABEL_CHARS: usize = 50;

static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(page|pg)[^a-z]*\d|[?&](p|paged|offset|start)=\d+")
        .expect("Invalid page parameter regex")
});

/// Which discovery phase produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    Pagination,
    Interaction,
    Scroll,
}

/// One interaction and the links it alone revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryStep {
    pub phase: DiscoveryPhase,
    pub label: String,
    pub new_links: Vec<String>,
}

/// Everything one discovery run found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Eligible links of the DOM before any interaction
    pub baseline: Vec<String>,

    pub steps: Vec<DiscoveryStep>,

    /// Union of all step deltas, in discovery order
    pub links: Vec<String>,
}

/// Cumulative record of links seen on the page so far
struct LinkLedger {
    known: HashSet<String>,
    found: Vec<String>,
}

impl LinkLedger {
    fn new(baseline: &[String]) -> Self {
        Self {
            known: baseline.iter().cloned().collect(),
            found: Vec::new(),
        }
    }

    /// Returns the links not seen before and adds them to the baseline
    fn absorb(&mut self, links: Vec<String>) -> Vec<String> {
        let mut delta = Vec::new();
        for link in links {
            if self.known.insert(link.clone()) {
                self.found.push(link.clone());
                delta.push(link);
            }
        }
        delta
    }
}

/// Drives pagination, interaction and scroll on a rendered session
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    policy: LinkPolicy,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(policy: LinkPolicy, config: DiscoveryConfig) -> Self {
        Self { policy, config }
    }

    /// Eligible links currently in the DOM, deduplicated, in document order
    pub async fn eligible_links(
        &self,
        session: &dyn RenderedSession,
    ) -> Result<Vec<String>, BrowserError> {
        let mut seen = HashSet::new();
        Ok(session
            .current_links()
            .await?
            .iter()
            .filter_map(|link| strip_fragment(link))
            .filter(|link| self.policy.accepts(link))
            .filter(|link| seen.insert(link.clone()))
            .collect())
    }

    /// Runs all three phases against the session
    ///
    /// Never fails: an element that cannot be read or clicked is logged and
    /// skipped, and a phase that cannot start is skipped as a whole.
    pub async fn discover(&self, session: &dyn RenderedSession, url: &str) -> DiscoveryReport {
        let baseline = match self.eligible_links(session).await {
            Ok(links) => links,
            Err(e) => {
                tracing::debug!("Could not read initial links of {}: {}", url, e);
                Vec::new()
            }
        };
        tracing::debug!("Starting discovery on {} with {} links", url, baseline.len());

        let mut ledger = LinkLedger::new(&baseline);
        let mut steps = Vec::new();

        self.numbered_pagination(session, url, &mut ledger, &mut steps)
            .await;
        self.generic_interactions(session, url, &mut ledger, &mut steps)
            .await;
        self.infinite_scroll(session, url, &mut ledger, &mut steps)
            .await;

        if !ledger.found.is_empty() {
            tracing::info!(
                "Discovered {} additional URLs on {} through {} interactions",
                ledger.found.len(),
                url,
                steps.len()
            );
        }

        DiscoveryReport {
            baseline,
            steps,
            links: ledger.found,
        }
    }

    async fn capture(&self, session: &dyn RenderedSession, ledger: &mut LinkLedger) -> Vec<String> {
        match self.eligible_links(session).await {
            Ok(links) => {
                let delta = ledger.absorb(links);
                tracing::trace!("Captured delta: {:?}", delta);
                delta
            }
            Err(e) => {
                tracing::debug!("Could not read links after interaction: {}", e);
                Vec::new()
            }
        }
    }

    // ===== Numbered pagination =====

    async fn numbered_pagination(
        &self,
        session: &dyn RenderedSession,
        url: &str,
        ledger: &mut LinkLedger,
        steps: &mut Vec<DiscoveryStep>,
    ) {
        let targets = match self.pagination_targets(session).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::debug!("Numbered pagination scan failed on {}: {}", url, e);
                return;
            }
        };

        if targets.is_empty() {
            tracing::debug!("No numbered pagination on {}", url);
            return;
        }
        tracing::debug!("Found {} numbered pagination elements on {}", targets.len(), url);

        for (number, label) in targets {
            match self.open_page_number(session, &label).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("Pagination element '{}' vanished on {}", label, url);
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Error clicking pagination page '{}' on {}: {}", label, url, e);
                    continue;
                }
            }

            let delta = self.capture(session, ledger).await;
            if !delta.is_empty() {
                tracing::info!("Found {} new URLs from pagination page {}", delta.len(), number);
            }
            steps.push(DiscoveryStep {
                phase: DiscoveryPhase::Pagination,
                label: format!("page {}", number),
                new_links: delta,
            });

            if let Err(e) = session.go_back().await {
                tracing::debug!("History back failed on {}: {}", url, e);
            }
            settle(self.config.back_settle_ms).await;
        }
    }

    /// Visible numbered controls with pagination context, ascending, unique
    async fn pagination_targets(
        &self,
        session: &dyn RenderedSession,
    ) -> Result<Vec<(u32, String)>, BrowserError> {
        let mut targets = Vec::new();
        for element in session.find_elements(PAGINATION_SELECTOR).await? {
            match page_number(element.as_ref()).await {
                Ok(Some(target)) => targets.push(target),
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping unreadable element: {}", e),
            }
        }

        targets.sort_by_key(|(number, _)| *number);
        targets.dedup_by_key(|(number, _)| *number);
        targets.truncate(self.config.max_pagination_clicks);
        Ok(targets)
    }

    /// Re-locates the control by its label and clicks it
    ///
    /// Going back rebuilds the DOM, so handles from the initial scan are
    /// stale by the second page.
    async fn open_page_number(
        &self,
        session: &dyn RenderedSession,
        label: &str,
    ) -> Result<bool, BrowserError> {
        let Some(element) = find_by_label(session, label).await? else {
            return Ok(false);
        };

        element.scroll_into_view().await?;
        settle(self.config.scroll_into_view_settle_ms).await;
        click_with_fallback(element.as_ref()).await?;
        settle(self.config.pagination_settle_ms).await;
        Ok(true)
    }

    // ===== Generic interactions =====

    async fn generic_interactions(
        &self,
        session: &dyn RenderedSession,
        url: &str,
        ledger: &mut LinkLedger,
        steps: &mut Vec<DiscoveryStep>,
    ) {
        let candidates = match self.interaction_candidates(session).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::debug!("Interaction scan failed on {}: {}", url, e);
                return;
            }
        };

        let mut budget = self.config.max_interactions;

        for (element, label) in candidates {
            if budget == 0 {
                break;
            }

            if let Err(e) = element.scroll_into_view().await {
                tracing::debug!("Could not scroll to '{}' on {}: {}", label, url, e);
                continue;
            }
            settle(self.config.scroll_into_view_settle_ms).await;

            if let Err(e) = click_with_fallback(element.as_ref()).await {
                tracing::debug!("Error clicking '{}' on {}: {}", label, url, e);
                continue;
            }
            budget -= 1;
            settle(self.config.click_settle_ms).await;

            let delta = self.capture(session, ledger).await;
            let productive = !delta.is_empty();
            if productive {
                tracing::info!("Found {} new URLs after clicking '{}'", delta.len(), label);
            }
            steps.push(DiscoveryStep {
                phase: DiscoveryPhase::Interaction,
                label: label.clone(),
                new_links: delta,
            });

            if !productive || !is_repeatable(&label) {
                continue;
            }

            for attempt in 0..self.config.max_repeat_clicks {
                if budget == 0 {
                    break;
                }
                if let Err(e) = element.force_click().await {
                    tracing::debug!("Repeated click on '{}' failed: {}", label, e);
                    break;
                }
                budget -= 1;
                settle(self.config.click_settle_ms).await;

                let delta = self.capture(session, ledger).await;
                if delta.is_empty() {
                    break;
                }
                tracing::info!("Found {} more URLs (click #{})", delta.len(), attempt + 2);
                steps.push(DiscoveryStep {
                    phase: DiscoveryPhase::Interaction,
                    label: format!("{} #{}", label, attempt + 2),
                    new_links: delta,
                });
            }
        }
    }

    async fn interaction_candidates(
        &self,
        session: &dyn RenderedSession,
    ) -> Result<Vec<(Box<dyn ElementHandle>, String)>, BrowserError> {
        let mut candidates = Vec::new();
        for element in session.find_elements(INTERACTION_SELECTOR).await? {
            match interaction_label(element.as_ref()).await {
                Ok(Some(label)) => candidates.push((element, label)),
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping unreadable element: {}", e),
            }
        }
        Ok(candidates)
    }

    // ===== Infinite scroll =====

    async fn infinite_scroll(
        &self,
        session: &dyn RenderedSession,
        url: &str,
        ledger: &mut LinkLedger,
        steps: &mut Vec<DiscoveryStep>,
    ) {
        let mut height = session.document_height().await.unwrap_or(0);

        for attempt in 1..=self.config.max_scroll_attempts {
            if let Err(e) = session.scroll_to_bottom().await {
                tracing::debug!("Scroll failed on {}: {}", url, e);
                break;
            }
            settle(self.config.scroll_settle_ms).await;

            let delta = self.capture(session, ledger).await;
            let new_height = session.document_height().await.unwrap_or(height);
            let grew = new_height > height;
            height = new_height;

            if delta.is_empty() && !grew {
                break;
            }
            if !delta.is_empty() {
                tracing::info!("Found {} URLs through infinite scroll", delta.len());
            }
            steps.push(DiscoveryStep {
                phase: DiscoveryPhase::Scroll,
                label: format!("scroll {}", attempt),
                new_links: delta,
            });
        }
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

async fn click_with_fallback(element: &dyn ElementHandle) -> Result<(), BrowserError> {
    if let Err(e) = element.click().await {
        tracing::debug!("Native click failed ({}), forcing script click", e);
        element.force_click().await?;
    }
    Ok(())
}

async fn find_by_label(
    session: &dyn RenderedSession,
    label: &str,
) -> Result<Option<Box<dyn ElementHandle>>, BrowserError> {
    for element in session.find_elements(PAGINATION_SELECTOR).await? {
        let matches = match element.text().await {
            Ok(text) => text.trim() == label,
            Err(_) => false,
        };
        if matches && element.is_visible().await.unwrap_or(false) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// Page number of a qualifying numbered pagination control
async fn page_number(element: &dyn ElementHandle) -> Result<Option<(u32, String)>, BrowserError> {
    let text = element.text().await?;
    let label = text.trim();

    let well_formed = !label.is_empty()
        && label.len() <= 2
        && !label.starts_with('0')
        && label.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Ok(None);
    }
    let number: u32 = match label.parse() {
        Ok(n) if (2..=99).contains(&n) => n,
        _ => return Ok(None),
    };

    if !element.is_visible().await? || !has_page_context(element).await? {
        return Ok(None);
    }

    Ok(Some((number, label.to_string())))
}

async fn has_page_context(element: &dyn ElementHandle) -> Result<bool, BrowserError> {
    let mut classes = vec![element.attribute("class").await?.unwrap_or_default()];
    classes.extend(element.ancestor_classes().await?);

    let class_hint = classes.iter().any(|class| {
        let class = class.to_lowercase();
        PAGE_CLASS_HINTS.iter().any(|hint| class.contains(hint))
    });
    if class_hint {
        return Ok(true);
    }

    for attr in ["href", "onclick"] {
        if let Some(value) = element.attribute(attr).await? {
            if PAGE_PARAM.is_match(&value) {
                return Ok(true);
            }
        }
    }

    Ok(element.attribute("data-page").await?.is_some())
}

/// Label of a qualifying next/more/load style control
async fn interaction_label(element: &dyn ElementHandle) -> Result<Option<String>, BrowserError> {
    let text = element.text().await?;
    let text_lower = text.to_lowercase();
    let class = element
        .attribute("class")
        .await?
        .unwrap_or_default()
        .to_lowercase();

    let hinted = INTERACTION_TEXT_HINTS.iter().any(|h| text_lower.contains(h))
        || INTERACTION_CLASS_HINTS.iter().any(|h| class.contains(h));
    let affordance = element.attribute("onclick").await?.is_some()
        || element.attribute("data-toggle").await?.is_some();

    if !hinted && !affordance {
        return Ok(None);
    }

    if let Some(href) = element.attribute("href").await? {
        if is_navigational(&href) {
            return Ok(None);
        }
    }

    if !element.is_visible().await? {
        return Ok(None);
    }

    let label: String = text.trim().chars().take(MAX_LABEL_CHARS).collect();
    Ok(Some(if label.is_empty() { class } else { label }))
}

/// True for hrefs that lead somewhere the crawler will follow anyway
fn is_navigational(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && !href.starts_with('#') && !href.to_lowercase().starts_with("javascript:")
}

fn is_repeatable(label: &str) -> bool {
    let label = label.to_lowercase();
    REPEAT_HINTS.iter().any(|hint| label.contains(hint))
}
