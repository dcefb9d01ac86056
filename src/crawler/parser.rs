//! HTML parser for extracting links and page signals
//!
//! This module handles parsing fetched HTML to extract:
//! - Links to follow (from `<a href>` tags)
//! - Page title
//! - Cheap hints that the page paginates or loads content dynamically

use scraper::{Html, Selector};
use url::Url;

/// Class fragments that suggest pagination controls
const PAGINATION_HINTS: &[&str] = &["next", "prev", "page", "pagination"];

/// Class fragments that suggest script-driven content
const DYNAMIC_HINTS: &[&str] = &["load-more", "show-more", "carousel", "slider", "tab"];

/// Pages with more than this many `<ul>` elements count as dynamic
const DYNAMIC_LIST_THRESHOLD: usize = 3;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// All links found on the page, absolute and without fragments
    pub links: Vec<String>,

    pub has_pagination: bool,
    pub has_dynamic_content: bool,
}

/// Parses HTML content and extracts links and page signals
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// Fragments are dropped from every resolved link so that `/page` and
/// `/page#top` are the same frontier entry.
///
/// # Example
///
/// ```
/// use sumi_strata::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page#x">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
        has_pagination: any_class_contains(&document, PAGINATION_HINTS),
        has_dynamic_content: any_class_contains(&document, DYNAMIC_HINTS)
            || count_elements(&document, "ul") > DYNAMIC_LIST_THRESHOLD,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

fn any_class_contains(document: &Html, hints: &[&str]) -> bool {
    let Ok(selector) = Selector::parse("[class]") else {
        return false;
    };

    document.select(&selector).any(|element| {
        element
            .value()
            .attr("class")
            .map(|class| {
                let class = class.to_lowercase();
                hints.iter().any(|hint| class.contains(hint))
            })
            .unwrap_or(false)
    })
}

fn count_elements(document: &Html, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|s| document.select(&s).count())
        .unwrap_or(0)
}

/// Resolves a link href to an absolute URL without its fragment
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Drops the fragment of an already absolute link
///
/// Used for links read back from a rendered DOM, which the browser has
/// already resolved.
pub fn strip_fragment(link: &str) -> Option<String> {
    let mut url = Url::parse(link).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_page("<html><head></head><body></body></html>", &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_relative_links_resolved() {
        let html = r#"<html><body><a href="/other">A</a><a href="sibling">B</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.links,
            vec!["https://example.com/other", "https://example.com/sibling"]
        );
    }

    #[test]
    fn test_fragments_dropped() {
        let html = r##"<html><body><a href="/faq#returns">FAQ</a><a href="#top">Top</a></body></html>"##;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/faq"]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"<html><body>
            <a href="javascript:void(0)">J</a>
            <a href="JavaScript:go()">J2</a>
            <a href="mailto:test@example.com">M</a>
            <a href="tel:+1234567890">T</a>
            <a href="data:text/html,hi">D</a>
            <a href="/kept">K</a>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/kept"]);
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.zip" download>Download</a></body></html>"#;
        assert!(parse_page(html, &base_url()).links.is_empty());
    }

    #[test]
    fn test_pagination_hint() {
        let html = r#"<html><body><div class="Pagination-Wrapper"></div></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.has_pagination);
        assert!(!parsed.has_dynamic_content);
    }

    #[test]
    fn test_dynamic_hint_from_class() {
        let html = r#"<html><body><button class="btn load-more">More</button></body></html>"#;
        assert!(parse_page(html, &base_url()).has_dynamic_content);
    }

    #[test]
    fn test_dynamic_hint_from_list_count() {
        let three = "<ul></ul>".repeat(3);
        let four = "<ul></ul>".repeat(4);
        assert!(!parse_page(&format!("<body>{}</body>", three), &base_url()).has_dynamic_content);
        assert!(parse_page(&format!("<body>{}</body>", four), &base_url()).has_dynamic_content);
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(
            strip_fragment("https://example.com/a#b"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(strip_fragment("not a url"), None);
    }
}
