use crate::analysis::dom::{self, Tally, HEADINGS};
use crate::analysis::interactive::count_skip_links;
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use url::Url;

const LANDMARKS: &str = "header, nav, main, section, article, aside, footer";
const FOCUSABLE: &str = "a, button, input, textarea, select";

/// ARIA usage, landmarks, keyboard reachability and screen reader support
pub struct AccessibilityAnalysis;

#[derive(Debug, Serialize)]
struct AccessibilityReport {
    aria_usage: AriaUsage,
    semantic_structure: SemanticStructure,
    keyboard_navigation: KeyboardNavigation,
    screen_reader_support: ScreenReaderSupport,
}

#[derive(Debug, Serialize)]
struct AriaUsage {
    total_aria_elements: usize,
    role_elements: usize,
    common_roles: Vec<Tally>,
    aria_labels: usize,
    aria_describedby: usize,
}

#[derive(Debug, Serialize)]
struct SemanticStructure {
    landmarks: Landmarks,
    heading_levels: Vec<Tally>,
    skip_links: usize,
}

#[derive(Debug, Serialize)]
struct Landmarks {
    count: usize,
    types: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct KeyboardNavigation {
    focusable_elements: usize,
    tabindex_elements: usize,
    negative_tabindex: usize,
}

#[derive(Debug, Serialize)]
struct ScreenReaderSupport {
    images_with_alt: usize,
    decorative_images: usize,
    labels: usize,
    inputs: usize,
    label_input_ratio: f64,
}

impl AnalysisStrategy for AccessibilityAnalysis {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn analyze(&self, document: &Html, _url: &Url) -> Result<Value, AnalysisError> {
        let elements = dom::select(document, "*")?;
        let roles = dom::select(document, "[role]")?;

        let aria_usage = AriaUsage {
            total_aria_elements: elements
                .iter()
                .filter(|e| dom::has_attr_prefix(**e, "aria-"))
                .count(),
            role_elements: roles.len(),
            common_roles: dom::tally(roles.iter().filter_map(|e| dom::attr(*e, "role"))),
            aria_labels: dom::count(document, "[aria-label]")?,
            aria_describedby: dom::count(document, "[aria-describedby]")?,
        };

        let landmarks = dom::select(document, LANDMARKS)?;
        let hrefs: Vec<&str> = dom::select(document, "a[href]")?
            .into_iter()
            .filter_map(|a| dom::attr(a, "href"))
            .collect();

        let semantic_structure = SemanticStructure {
            landmarks: Landmarks {
                count: landmarks.len(),
                types: dom::tally(landmarks.iter().map(|e| e.value().name())),
            },
            heading_levels: dom::tally(
                dom::select(document, HEADINGS)?
                    .iter()
                    .map(|h| h.value().name()),
            ),
            skip_links: count_skip_links(&hrefs),
        };

        let tabindexed = dom::select(document, "[tabindex]")?;
        let keyboard_navigation = KeyboardNavigation {
            focusable_elements: dom::count(document, FOCUSABLE)?,
            tabindex_elements: tabindexed.len(),
            negative_tabindex: tabindexed
                .iter()
                .filter_map(|e| dom::attr(*e, "tabindex"))
                .filter(|t| t.trim().parse::<i64>().map_or(false, |n| n < 0))
                .count(),
        };

        let labels = dom::count(document, "label")?;
        let inputs = dom::count(document, "input, textarea, select")?;
        let label_input_ratio = if inputs == 0 {
            0.0
        } else {
            labels as f64 / inputs as f64
        };

        let screen_reader_support = ScreenReaderSupport {
            images_with_alt: dom::count(document, "img[alt]")?,
            decorative_images: dom::count(document, r#"img[alt=""]"#)?,
            labels,
            inputs,
            label_input_ratio,
        };

        to_metrics(&AccessibilityReport {
            aria_usage,
            semantic_structure,
            keyboard_navigation,
            screen_reader_support,
        })
    }
}
