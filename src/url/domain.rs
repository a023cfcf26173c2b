use url::Url;

/// Extracts the lowercase host from a parsed URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::extract_domain;
///
/// let url = Url::parse("https://News.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("news.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Extracts the lowercase host from a raw URL string
///
/// Returns `None` when the string does not parse or carries no host. Used
/// for pacing keys and source lookup on frontier keys, which are already
/// normalized.
pub fn domain_of(raw: &str) -> Option<String> {
    Url::parse(raw).ok().as_ref().and_then(extract_domain)
}
