//! Small query helpers shared by the analysis passes

use crate::analysis::AnalysisError;
use crate::url::netloc;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

pub const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

/// One value of a frequency count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub value: String,
    pub count: usize,
}

/// Counts values, most frequent first, ties in first-seen order
pub fn tally<I, S>(values: I) -> Vec<Tally>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<Tally> = Vec::new();

    for value in values {
        let value = value.into();
        match index.get(&value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push(Tally { value, count: 1 });
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Like [`tally`], keeping only the `n` most frequent values
pub fn top<I, S>(values: I, n: usize) -> Vec<Tally>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts = tally(values);
    counts.truncate(n);
    counts
}

pub fn selector(css: &str) -> Result<Selector, AnalysisError> {
    Selector::parse(css).map_err(|e| AnalysisError::Selector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

/// All matches of `css` in document order
pub fn select<'a>(document: &'a Html, css: &str) -> Result<Vec<ElementRef<'a>>, AnalysisError> {
    let selector = selector(css)?;
    Ok(document.select(&selector).collect())
}

pub fn count(document: &Html, css: &str) -> Result<usize, AnalysisError> {
    let selector = selector(css)?;
    Ok(document.select(&selector).count())
}

/// Matches of `css` strictly below `element`
pub fn select_within<'a>(
    element: ElementRef<'a>,
    css: &str,
) -> Result<Vec<ElementRef<'a>>, AnalysisError> {
    let selector = selector(css)?;
    let own_id = element.id();
    Ok(element
        .select(&selector)
        .filter(|e| e.id() != own_id)
        .collect())
}

pub fn count_within(element: ElementRef<'_>, css: &str) -> Result<usize, AnalysisError> {
    Ok(select_within(element, css)?.len())
}

pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First `n` characters of the element's text
pub fn text_preview(element: ElementRef<'_>, n: usize) -> String {
    element.text().flat_map(str::chars).take(n).collect()
}

pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

pub fn attr_or_empty(element: ElementRef<'_>, name: &str) -> String {
    attr(element, name).unwrap_or("").to_string()
}

pub fn classes(element: ElementRef<'_>) -> Vec<String> {
    element.value().classes().map(str::to_string).collect()
}

/// Whether any attribute name starts with `prefix`
pub fn has_attr_prefix(element: ElementRef<'_>, prefix: &str) -> bool {
    element
        .value()
        .attrs()
        .any(|(name, _)| name.starts_with(prefix))
}

/// Child elements, skipping text and comments
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// True for absolute http(s) links whose network location differs from the page's
///
/// Relative links are never external.
pub fn is_external(href: &str, page: &Url) -> bool {
    if !(href.starts_with("http://") || href.starts_with("https://")) {
        return false;
    }
    match Url::parse(href) {
        Ok(link) => netloc(&link) != netloc(page),
        Err(_) => false,
    }
}

/// Network location of an absolute link, empty when it has none
pub fn link_netloc(href: &str) -> String {
    Url::parse(href)
        .ok()
        .and_then(|u| netloc(&u))
        .unwrap_or_default()
}

/// Class-name fragments per CSS framework
pub const FRAMEWORK_INDICATORS: &[(&str, &[&str])] = &[
    ("bootstrap", &["container", "row", "col-", "btn-", "navbar", "card"]),
    ("tailwind", &["flex", "grid", "p-", "m-", "text-", "bg-"]),
    ("bulma", &["column", "columns", "section", "hero", "navbar"]),
    ("foundation", &["grid-x", "cell", "callout", "button"]),
    ("materialize", &["collection", "waves-effect", "material-icons"]),
    ("semantic_ui", &["ui", "segment", "container", "grid"]),
];

/// Number of indicators of a framework that appear in at least one class
pub fn framework_matches(indicators: &[&str], classes: &[String]) -> usize {
    indicators
        .iter()
        .filter(|indicator| classes.iter().any(|class| class.contains(*indicator)))
        .count()
}

/// Every class of every element, in document order
pub fn all_classes(document: &Html) -> Result<Vec<String>, AnalysisError> {
    Ok(select(document, "[class]")?
        .into_iter()
        .flat_map(classes)
        .collect())
}
