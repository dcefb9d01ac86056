use crate::analysis::dom::{self, FRAMEWORK_INDICATORS};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

const RESPONSIVE_HINTS: &[&str] = &["sm-", "md-", "lg-", "xl-", "mobile", "tablet", "desktop"];

static CONTAINER_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new("container|wrapper|main|content").expect("Invalid container regex"));
static GRID_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new("grid|row|flex").expect("Invalid grid regex"));
static SIDEBAR_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new("sidebar|aside|secondary").expect("Invalid sidebar regex"));
static HEADER_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new("header").expect("Invalid header regex"));
static FOOTER_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new("footer").expect("Invalid footer regex"));

/// CSS framework fingerprints, layout regions and responsive hints
pub struct LayoutAnalysis;

#[derive(Debug, Serialize)]
struct LayoutReport {
    css_frameworks: BTreeMap<&'static str, FrameworkMatch>,
    layout_patterns: LayoutPatterns,
    responsive_indicators: ResponsiveIndicators,
}

#[derive(Debug, Serialize)]
struct FrameworkMatch {
    matches: usize,
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct LayoutPatterns {
    containers: usize,
    grid_elements: usize,
    sidebars: usize,
    header_footer: HeaderFooter,
}

#[derive(Debug, Serialize)]
struct HeaderFooter {
    headers: usize,
    footers: usize,
}

#[derive(Debug, Serialize)]
struct ResponsiveIndicators {
    viewport_meta: bool,
    viewport_content: String,
    media_queries_count: usize,
    responsive_classes: usize,
}

impl AnalysisStrategy for LayoutAnalysis {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn analyze(&self, document: &Html, _url: &Url) -> Result<Value, AnalysisError> {
        let classes = dom::all_classes(document)?;

        let css_frameworks = FRAMEWORK_INDICATORS
            .iter()
            .filter_map(|(name, indicators)| {
                let matches = dom::framework_matches(indicators, &classes);
                (matches > 0).then(|| {
                    let confidence = (matches as f64 / indicators.len() as f64).min(1.0);
                    (*name, FrameworkMatch { matches, confidence })
                })
            })
            .collect();

        let class_count = |css: &str, pattern: &Regex| -> Result<usize, AnalysisError> {
            Ok(dom::select(document, css)?
                .into_iter()
                .filter(|e| dom::attr(*e, "class").map_or(false, |c| pattern.is_match(c)))
                .count())
        };

        let layout_patterns = LayoutPatterns {
            containers: class_count("[class]", &*CONTAINER_CLASS)?,
            grid_elements: class_count("[class]", &*GRID_CLASS)?,
            sidebars: class_count("[class]", &*SIDEBAR_CLASS)?,
            header_footer: HeaderFooter {
                headers: class_count("header, div", &*HEADER_CLASS)?,
                footers: class_count("footer, div", &*FOOTER_CLASS)?,
            },
        };

        let viewport = dom::select(document, r#"meta[name="viewport"]"#)?
            .first()
            .map(|meta| dom::attr_or_empty(*meta, "content"));

        let responsive_indicators = ResponsiveIndicators {
            viewport_meta: viewport.is_some(),
            viewport_content: viewport.unwrap_or_default(),
            media_queries_count: document.html().matches("@media").count(),
            responsive_classes: classes
                .iter()
                .filter(|c| RESPONSIVE_HINTS.iter().any(|hint| c.contains(hint)))
                .count(),
        };

        to_metrics(&LayoutReport {
            css_frameworks,
            layout_patterns,
            responsive_indicators,
        })
    }
}
