use crate::analysis::dom::{self, Tally, FRAMEWORK_INDICATORS};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::{ElementRef, Html};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use url::Url;

const LAYOUT_KEYWORDS: &[&str] = &["container", "wrapper", "layout", "grid", "flex"];

/// Containers nested deeper than this many ancestors count as deeply nested
const DEEP_NESTING: usize = 10;

/// DOM shape: depth, element and class distribution, ids, containers
pub struct StructuralAnalysis;

#[derive(Debug, Serialize)]
struct StructuralReport {
    dom_depth: usize,
    total_elements: usize,
    element_distribution: Vec<Tally>,
    class_patterns: ClassPatterns,
    id_patterns: IdPatterns,
    container_analysis: ContainerAnalysis,
}

#[derive(Debug, Serialize)]
struct ClassPatterns {
    most_common: Vec<Tally>,
    total_unique_classes: usize,
    framework_indicators: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Serialize)]
struct IdPatterns {
    total_ids: usize,
    common_prefixes: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct ContainerAnalysis {
    total_containers: usize,
    deeply_nested: usize,
    layout_containers: Vec<LayoutContainer>,
}

#[derive(Debug, Serialize)]
struct LayoutContainer {
    tag: String,
    classes: Vec<String>,
    children_count: usize,
}

impl AnalysisStrategy for StructuralAnalysis {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn analyze(&self, document: &Html, _url: &Url) -> Result<Value, AnalysisError> {
        let elements = dom::select(document, "*")?;

        let dom_depth = match dom::select(document, "body")?.first() {
            Some(body) => depth_below(*body),
            None => depth_below(document.root_element()),
        };

        let classes = dom::all_classes(document)?;
        let unique: HashSet<&String> = classes.iter().collect();
        let class_patterns = ClassPatterns {
            most_common: dom::top(classes.iter().cloned(), 20),
            total_unique_classes: unique.len(),
            framework_indicators: FRAMEWORK_INDICATORS
                .iter()
                .map(|(name, indicators)| (*name, dom::framework_matches(indicators, &classes)))
                .filter(|(_, matches)| *matches > 0)
                .collect(),
        };

        let ids: Vec<&str> = elements
            .iter()
            .filter_map(|e| dom::attr(*e, "id"))
            .filter(|id| !id.is_empty())
            .collect();
        let id_patterns = IdPatterns {
            total_ids: ids.len(),
            common_prefixes: dom::top(ids.iter().filter_map(|id| id_prefix(id)), 10),
        };

        let report = StructuralReport {
            dom_depth,
            total_elements: elements.len(),
            element_distribution: dom::top(elements.iter().map(|e| e.value().name()), 20),
            class_patterns,
            id_patterns,
            container_analysis: containers(document)?,
        };

        to_metrics(&report)
    }
}

/// Deepest element level below `root`, with `root` at level 0
fn depth_below(root: ElementRef<'_>) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((element, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(dom::child_elements(element).map(|child| (child, depth + 1)));
    }

    deepest
}

/// Prefix before the first `-`, or else before the first `_`
fn id_prefix(id: &str) -> Option<&str> {
    id.split_once('-')
        .or_else(|| id.split_once('_'))
        .map(|(prefix, _)| prefix)
}

fn containers(document: &Html) -> Result<ContainerAnalysis, AnalysisError> {
    let containers = dom::select(document, "div, section, article, main, aside")?;

    let deeply_nested = containers
        .iter()
        .filter(|c| c.ancestors().count() > DEEP_NESTING)
        .count();

    let layout_containers = containers
        .iter()
        .filter(|c| {
            let joined = dom::classes(**c).join(" ").to_lowercase();
            LAYOUT_KEYWORDS.iter().any(|k| joined.contains(k))
        })
        .map(|c| LayoutContainer {
            tag: c.value().name().to_string(),
            classes: dom::classes(*c),
            children_count: dom::child_elements(*c).count(),
        })
        .collect();

    Ok(ContainerAnalysis {
        total_containers: containers.len(),
        deeply_nested,
        layout_containers,
    })
}
