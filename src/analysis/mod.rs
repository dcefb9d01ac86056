//! Multi-strategy page analysis
//!
//! Eight independent passes look at the same parsed page from different
//! angles: semantic markup, DOM structure, content mix, interactivity,
//! layout frameworks, SEO, accessibility and performance hints. Each pass
//! produces a nested metric object. A pass that fails (or panics) is
//! replaced by `{"error": "<message>"}` and the others still run.

mod accessibility;
mod content_type;
mod dom;
mod interactive;
mod layout;
mod performance;
mod semantic;
mod seo;
mod structural;

pub use accessibility::AccessibilityAnalysis;
pub use content_type::ContentTypeAnalysis;
pub use dom::Tally;
pub use interactive::InteractiveAnalysis;
pub use layout::LayoutAnalysis;
pub use performance::PerformanceAnalysis;
pub use semantic::SemanticAnalysis;
pub use seo::SeoAnalysis;
pub use structural::StructuralAnalysis;

use crate::components::panic_message;
use scraper::Html;
use serde::Serialize;
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use url::Url;

/// Errors raised inside one analysis pass
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

/// One analysis pass over a parsed page
pub trait AnalysisStrategy: Send + Sync {
    /// Stable name, used as the `<name>_analysis.json` file stem
    fn name(&self) -> &'static str;

    fn analyze(&self, document: &Html, url: &Url) -> Result<Value, AnalysisError>;
}

/// Serializes a typed report into the metric object of a pass
pub(crate) fn to_metrics<T: Serialize>(report: &T) -> Result<Value, AnalysisError> {
    Ok(serde_json::to_value(report)?)
}

/// Metrics of one pass over one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    pub strategy: &'static str,
    pub metrics: Value,
}

impl StrategyResult {
    pub fn is_error(&self) -> bool {
        self.metrics.get("error").is_some()
    }
}

/// Runs every configured pass over a page
pub struct PageAnalyzer {
    strategies: Vec<Box<dyn AnalysisStrategy>>,
}

impl Default for PageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAnalyzer {
    /// Analyzer with all eight passes
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    pub fn with_strategies(strategies: Vec<Box<dyn AnalysisStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs every pass, in order
    ///
    /// Never fails: a pass that errors or panics is reported inline.
    pub fn analyze(&self, document: &Html, url: &Url) -> Vec<StrategyResult> {
        self.strategies
            .iter()
            .map(|strategy| {
                let name = strategy.name();
                let outcome = catch_unwind(AssertUnwindSafe(|| strategy.analyze(document, url)));

                let metrics = match outcome {
                    Ok(Ok(metrics)) => metrics,
                    Ok(Err(e)) => {
                        tracing::error!("Error in {} analysis for {}: {}", name, url, e);
                        json!({ "error": e.to_string() })
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::error!("{} analysis panicked for {}: {}", name, url, message);
                        json!({ "error": message })
                    }
                };

                StrategyResult {
                    strategy: name,
                    metrics,
                }
            })
            .collect()
    }
}

/// The eight passes in their canonical order
pub fn default_strategies() -> Vec<Box<dyn AnalysisStrategy>> {
    vec![
        Box::new(SemanticAnalysis),
        Box::new(StructuralAnalysis),
        Box::new(ContentTypeAnalysis),
        Box::new(InteractiveAnalysis),
        Box::new(LayoutAnalysis),
        Box::new(SeoAnalysis),
        Box::new(AccessibilityAnalysis),
        Box::new(PerformanceAnalysis),
    ]
}
