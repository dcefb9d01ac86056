use crate::analysis::dom::{self, Tally};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub(crate) const SKIP_LINK_TARGETS: &[&str] = &["#skip", "#main", "#content"];

/// Forms, links, media controls and script hooks a visitor can interact with
pub struct InteractiveAnalysis;

#[derive(Debug, Serialize)]
struct InteractiveReport {
    form_elements: FormElements,
    navigation_elements: NavigationElements,
    media_controls: MediaControls,
    dynamic_elements: DynamicElements,
    accessibility_features: AccessibilityFeatures,
}

#[derive(Debug, Serialize)]
struct FormElements {
    forms: Vec<FormDetail>,
    total_forms: usize,
}

#[derive(Debug, Serialize)]
struct FormDetail {
    action: String,
    method: String,
    input_count: usize,
    input_types: Vec<Tally>,
    has_validation: bool,
    has_labels: usize,
}

#[derive(Debug, Serialize)]
struct NavigationElements {
    nav_containers: usize,
    total_links: usize,
    anchor_links: usize,
    download_links: usize,
    external_links: usize,
}

#[derive(Debug, Serialize)]
struct MediaControls {
    controllable_media: usize,
    autoplay_media: usize,
    muted_media: usize,
}

#[derive(Debug, Serialize)]
struct DynamicElements {
    onclick_elements: usize,
    data_attributes: usize,
    common_data_attrs: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct AccessibilityFeatures {
    aria_elements: usize,
    role_elements: usize,
    alt_texts: usize,
    skip_links: usize,
}

impl AnalysisStrategy for InteractiveAnalysis {
    fn name(&self) -> &'static str {
        "interactive"
    }

    fn analyze(&self, document: &Html, url: &Url) -> Result<Value, AnalysisError> {
        let mut forms = Vec::new();
        for form in dom::select(document, "form")? {
            let inputs = dom::select_within(form, "input, textarea, select")?;
            forms.push(FormDetail {
                action: dom::attr_or_empty(form, "action"),
                method: dom::attr(form, "method").unwrap_or("get").to_string(),
                input_count: inputs.len(),
                input_types: dom::tally(
                    inputs
                        .iter()
                        .filter(|i| i.value().name() == "input")
                        .map(|i| dom::attr(*i, "type").unwrap_or("text")),
                ),
                has_validation: dom::count_within(form, "[required]")? > 0,
                has_labels: dom::count_within(form, "label")?,
            });
        }

        let links = dom::select(document, "a[href]")?;
        let hrefs: Vec<&str> = links.iter().filter_map(|a| dom::attr(*a, "href")).collect();

        let media = dom::select(document, "video, audio")?;
        let media_with = |name: &str| media.iter().filter(|m| dom::attr(**m, name).is_some()).count();

        let elements = dom::select(document, "*")?;
        let data_elements: Vec<_> = elements
            .iter()
            .filter(|e| dom::has_attr_prefix(**e, "data-"))
            .collect();
        let data_names = data_elements.iter().flat_map(|e| {
            e.value()
                .attrs()
                .map(|(name, _)| name)
                .filter(|name| name.starts_with("data-"))
        });

        let report = InteractiveReport {
            form_elements: FormElements {
                total_forms: forms.len(),
                forms,
            },
            navigation_elements: NavigationElements {
                nav_containers: dom::count(document, "nav")?,
                total_links: hrefs.len(),
                anchor_links: hrefs.iter().filter(|h| h.starts_with('#')).count(),
                download_links: links
                    .iter()
                    .filter(|a| dom::attr(**a, "download").is_some())
                    .count(),
                external_links: hrefs.iter().filter(|h| dom::is_external(h, url)).count(),
            },
            media_controls: MediaControls {
                controllable_media: media_with("controls"),
                autoplay_media: media_with("autoplay"),
                muted_media: media_with("muted"),
            },
            dynamic_elements: DynamicElements {
                onclick_elements: dom::count(document, "[onclick]")?,
                data_attributes: data_elements.len(),
                common_data_attrs: dom::top(data_names, 10),
            },
            accessibility_features: AccessibilityFeatures {
                aria_elements: elements
                    .iter()
                    .filter(|e| dom::has_attr_prefix(**e, "aria-"))
                    .count(),
                role_elements: dom::count(document, "[role]")?,
                alt_texts: dom::count(document, "img[alt]")?,
                skip_links: count_skip_links(&hrefs),
            },
        };

        to_metrics(&report)
    }
}

pub(crate) fn count_skip_links(hrefs: &[&str]) -> usize {
    hrefs
        .iter()
        .filter(|h| SKIP_LINK_TARGETS.iter().any(|t| h.starts_with(t)))
        .count()
}
