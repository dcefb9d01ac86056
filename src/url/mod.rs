//! URL handling module for Sumi-Strata
//!
//! This module decides which discovered links belong to the crawl, extracts
//! network locations, and derives the page identifiers used on disk.

mod domain;
mod identifier;

use url::{ParseError, Url};

// Re-export main functions
pub use domain::netloc;
pub use identifier::{page_identifier, MAX_IDENTIFIER_LEN};

/// Path suffixes that never lead to an HTML page
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".doc", ".docx", ".xls", ".xlsx",
];

/// Path fragments for areas the crawler stays out of
pub const EXCLUDED_PATHS: &[&str] = &["/admin", "/login", "/logout", "/api/", "/download"];

/// Decides whether a candidate link may enter the crawl frontier
///
/// The rules are applied in order:
/// 1. An absolute or protocol-relative (`//host/...`) URL whose network
///    location differs from `site_domain` is rejected. Other relative
///    references have no network location and pass.
/// 2. Anything that is not `http` or `https` (`mailto:`, `tel:`,
///    `javascript:` ...) is rejected, as is anything that fails to parse.
/// 3. A path ending in one of [`EXCLUDED_EXTENSIONS`] is rejected.
/// 4. A path containing one of [`EXCLUDED_PATHS`] is rejected.
///
/// Extension and path checks are case-insensitive.
///
/// # Arguments
///
/// * `candidate` - The link as found on the page, absolute or relative
/// * `site_domain` - Network location of the crawl's seed (`host[:port]`)
///
/// # Examples
///
/// ```
/// use sumi_strata::url::is_eligible;
///
/// assert!(is_eligible("https://example.com/blog/", "example.com"));
/// assert!(is_eligible("/relative/page", "example.com"));
/// assert!(!is_eligible("https://other.com/", "example.com"));
/// assert!(!is_eligible("https://example.com/report.PDF", "example.com"));
/// assert!(!is_eligible("https://example.com/admin/users", "example.com"));
/// ```
pub fn is_eligible(candidate: &str, site_domain: &str) -> bool {
    let path = match Url::parse(candidate) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                return false;
            }
            match netloc(&url) {
                Some(location) if location.eq_ignore_ascii_case(site_domain) => {}
                _ => return false,
            }
            url.path().to_lowercase()
        }
        // Protocol-relative references carry a network location of their own
        Err(ParseError::RelativeUrlWithoutBase) if candidate.starts_with("//") => {
            return is_eligible(&format!("https:{}", candidate), site_domain);
        }
        Err(ParseError::RelativeUrlWithoutBase) => relative_path(candidate).to_lowercase(),
        Err(_) => return false,
    };

    if EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }

    !EXCLUDED_PATHS.iter().any(|fragment| path.contains(fragment))
}

/// Path part of a relative reference, without query or fragment
fn relative_path(reference: &str) -> &str {
    let end = reference
        .find(|c| c == '?' || c == '#')
        .unwrap_or(reference.len());
    &reference[..end]
}

/// Link filter bound to one crawl's site domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    site_domain: String,
}

impl LinkPolicy {
    /// Creates a policy for an explicit network location
    pub fn new(site_domain: impl Into<String>) -> Self {
        Self {
            site_domain: site_domain.into().to_lowercase(),
        }
    }

    /// Creates a policy whose site domain is the seed URL's network location
    pub fn for_seed(seed: &Url) -> Result<Self, ParseError> {
        netloc(seed).map(Self::new).ok_or(ParseError::EmptyHost)
    }

    pub fn site_domain(&self) -> &str {
        &self.site_domain
    }

    /// Returns true if the link may enter the frontier
    pub fn accepts(&self, candidate: &str) -> bool {
        is_eligible(candidate, &self.site_domain)
    }

    /// Keeps the eligible links, preserving their order
    pub fn retain_eligible<I>(&self, links: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        links.into_iter().filter(|l| self.accepts(l)).collect()
    }
}
