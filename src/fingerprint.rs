//! Content fingerprints for change detection

use sha2::{Digest, Sha256};

/// Computes the fingerprint of extracted article content
///
/// The fingerprint is the lowercase hex SHA-256 digest of the content. Two
/// fetches of an unchanged article produce the same fingerprint.
///
/// # Examples
///
/// ```
/// use driftnet::content_fingerprint;
///
/// let a = content_fingerprint("<p>Hello</p>");
/// assert_eq!(a, content_fingerprint("<p>Hello</p>"));
/// assert_eq!(a.len(), 64);
/// ```
pub fn content_fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_content_different_fingerprint() {
        assert_ne!(
            content_fingerprint("<p>version one</p>"),
            content_fingerprint("<p>version two</p>")
        );
    }
}
