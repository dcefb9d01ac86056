use url::Url;

/// Extracts the network location of a URL
///
/// The network location is the lowercase host plus the port when one is
/// given explicitly. Default ports are not part of it, so
/// `https://example.com:443/` and `https://example.com/` share a location.
///
/// # Arguments
///
/// * `url` - The URL to extract the network location from
///
/// # Returns
///
/// * `Some(String)` - `host` or `host:port`
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_strata::url::netloc;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("localhost:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
