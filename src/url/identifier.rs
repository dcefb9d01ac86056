use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Longest identifier produced, in characters
pub const MAX_IDENTIFIER_LEN: usize = 100;

static PATH_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-.]").expect("Invalid path sanitizer regex"));

static UNDERSCORE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("Invalid underscore regex"));

/// Builds the filesystem-safe identifier used to name a page's output directory
///
/// The identifier is derived from the path and query only, so two URLs that
/// differ only in scheme, host or fragment map to the same directory. It is
/// pure and deterministic, which makes it the key for skip-if-exists. The
/// result only holds word characters, hyphens and periods.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_strata::url::page_identifier;
///
/// let url = Url::parse("https://example.com/blog/post-1.html").unwrap();
/// assert_eq!(page_identifier(&url), "blog_post-1");
///
/// let url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(page_identifier(&url), "homepage");
/// ```
pub fn page_identifier(url: &Url) -> String {
    let path = sanitize(url.path());
    let path = path.strip_suffix(".html").unwrap_or(&path);

    let mut identifier = if path.is_empty() {
        "homepage".to_string()
    } else {
        path.to_string()
    };

    let query = sanitize(url.query().unwrap_or_default());
    if !query.is_empty() {
        identifier.push_str("_query_");
        identifier.push_str(&query);
    }

    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        identifier = identifier.chars().take(MAX_IDENTIFIER_LEN).collect();
    }

    identifier
}

/// Replaces unsafe characters with `_`, collapsing runs and trimming the ends
fn sanitize(raw: &str) -> String {
    let cleaned = PATH_UNSAFE.replace_all(raw, "_");
    UNDERSCORE_RUNS
        .replace_all(&cleaned, "_")
        .trim_matches('_')
        .to_string()
}
