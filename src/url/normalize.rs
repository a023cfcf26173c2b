use std::fmt;
use std::hash::{Hash, Hasher};
use url::{ParseError, Url};

/// A URL reduced to its comparable key
///
/// Equality and hashing only consider the key. A URL that could not be
/// parsed keeps its raw text as the key and is flagged as non-canonical.
#[derive(Debug, Clone)]
pub struct NormalizedUrl {
    key: String,
    canonical: bool,
}

impl NormalizedUrl {
    /// Returns the normalized key
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Whether the key came from a successfully parsed URL
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl PartialEq for NormalizedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NormalizedUrl {}

impl Hash for NormalizedUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Normalizes a URL for frontier deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; a scheme-less input is retried as `https://`
/// 2. Remove the fragment
/// 3. Remove leading `www.` labels from the host
///
/// The query string is kept, since paginated listings rely on it.
/// Malformed input is returned unchanged and marked non-canonical.
///
/// # Examples
///
/// ```
/// use driftnet::url::normalize_for_dedup;
///
/// let url = normalize_for_dedup("https://WWW.Example.com/news?page=2#top");
/// assert_eq!(url.as_str(), "https://example.com/news?page=2");
/// ```
pub fn normalize_for_dedup(raw: &str) -> NormalizedUrl {
    normalize(raw, false)
}

/// Normalizes a URL extracted from a page's links
///
/// Applies every step of [`normalize_for_dedup`] and also drops the query
/// string, so tracking variants of one article collapse into one key.
///
/// # Examples
///
/// ```
/// use driftnet::url::normalize_for_links;
///
/// let url = normalize_for_links("https://www.example.com/sport/story?ref=home");
/// assert_eq!(url.as_str(), "https://example.com/sport/story");
/// ```
pub fn normalize_for_links(raw: &str) -> NormalizedUrl {
    normalize(raw, true)
}

fn normalize(raw: &str, strip_query: bool) -> NormalizedUrl {
    let Some(mut url) = parse_with_default_scheme(raw) else {
        return NormalizedUrl {
            key: raw.to_string(),
            canonical: false,
        };
    };

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let stripped = strip_www(host);
        if stripped.len() != host.len() {
            let stripped = stripped.to_string();
            // Hosts that cannot be rewritten (IP literals, opaque hosts) stay as parsed
            let _ = url.set_host(Some(&stripped));
        }
    }

    if strip_query {
        url.set_query(None);
    }

    NormalizedUrl {
        key: url.into(),
        canonical: true,
    }
}

/// Parses a URL, defaulting a missing scheme to https
fn parse_with_default_scheme(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let candidate = if trimmed.starts_with("//") {
                format!("https:{}", trimmed)
            } else {
                format!("https://{}", trimmed)
            };
            Url::parse(&candidate).ok()
        }
        Err(_) => None,
    }
}

/// Strips every leading `www.` label while leaving a non-empty host
fn strip_www(host: &str) -> &str {
    let mut current = host;
    while let Some(rest) = current.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        current = rest;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        let url = normalize_for_dedup("https://example.com/page#section");
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_www() {
        let url = normalize_for_dedup("https://www.example.com/page");
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_repeated_www() {
        let url = normalize_for_dedup("https://www.www.example.com/");
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_lowercase_host() {
        let url = normalize_for_dedup("https://WWW.EXAMPLE.COM/Page");
        assert_eq!(url.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_dedup_keeps_query() {
        let url = normalize_for_dedup("https://example.com/list?page=2");
        assert_eq!(url.as_str(), "https://example.com/list?page=2");
    }

    #[test]
    fn test_links_drop_query() {
        let url = normalize_for_links("https://example.com/sport/2024/jan/1/article-a?ref=x");
        assert_eq!(url.as_str(), "https://example.com/sport/2024/jan/1/article-a");
    }

    #[test]
    fn test_default_scheme_is_https() {
        let url = normalize_for_dedup("example.com/news");
        assert_eq!(url.as_str(), "https://example.com/news");
        assert!(url.is_canonical());

        let url = normalize_for_dedup("//www.example.com/news");
        assert_eq!(url.as_str(), "https://example.com/news");
    }

    #[test]
    fn test_http_scheme_is_preserved() {
        let url = normalize_for_dedup("http://www.example.com/a");
        assert_eq!(url.as_str(), "http://example.com/a");
    }

    #[test]
    fn test_malformed_url_returned_unchanged() {
        let url = normalize_for_dedup("https://exa mple.com/x");
        assert_eq!(url.as_str(), "https://exa mple.com/x");
        assert!(!url.is_canonical());

        let empty = normalize_for_links("");
        assert_eq!(empty.as_str(), "");
        assert!(!empty.is_canonical());
    }

    #[test]
    fn test_bare_www_host_is_kept() {
        let url = normalize_for_dedup("https://www./x");
        assert!(url.as_str().starts_with("https://www."));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "https://www.example.com/a/b?c=1#frag",
            "HTTP://WWW.Example.COM",
            "example.com/path with space",
            "//cdn.example.com/x",
            "https://www.www.example.com/",
            "https://example.com:8080/a/../b",
            "not a url at all",
            "mailto:someone@example.com",
            "https://[::1]/x",
            "",
        ];

        for input in inputs {
            let once = normalize_for_dedup(input);
            let twice = normalize_for_dedup(once.as_str());
            assert_eq!(once, twice, "dedup not idempotent for {:?}", input);

            let once = normalize_for_links(input);
            let twice = normalize_for_links(once.as_str());
            assert_eq!(once, twice, "links not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_equality_ignores_canonical_flag() {
        let a = NormalizedUrl {
            key: "x".to_string(),
            canonical: true,
        };
        let b = NormalizedUrl {
            key: "x".to_string(),
            canonical: false,
        };
        assert_eq!(a, b);
    }
}
