use std::fmt;

use md5::{Digest, Md5};
use url::Url;

/// Content-addressed cache key for a resource.
///
/// Derived deterministically from the normalized absolute form of the source
/// URL, so two requests for the same resource always land on the same disk
/// entry. The 128-bit digest is wide enough for a non-adversarial setting;
/// collisions are not handled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for a parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let mut hasher = Md5::new();
        hasher.update(url.as_str().as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    /// The hex-encoded digest, usable directly as a filename.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        assert_eq!(CacheKey::from_url(&url), CacheKey::from_url(&url));
    }

    #[test]
    fn test_digest_is_stable_across_builds() {
        // Pinned vectors: a key change would orphan every existing cache entry.
        let url = Url::parse("https://x/img.png").unwrap();
        assert_eq!(
            CacheKey::from_url(&url).as_str(),
            "57ea7712f530081640bb8a9a5914911b"
        );

        let url = Url::parse("https://example.com/a.png").unwrap();
        assert_eq!(
            CacheKey::from_url(&url).as_str(),
            "8c11d92f07c76baf29e49afd2301deb2"
        );
    }

    #[test]
    fn test_distinct_urls_produce_distinct_keys() {
        let a = Url::parse("https://example.com/a.png").unwrap();
        let b = Url::parse("https://example.com/b.png").unwrap();
        assert_ne!(CacheKey::from_url(&a), CacheKey::from_url(&b));
    }

    #[test]
    fn test_url_normalization_unifies_keys() {
        // Host case and default port are normalized away by the URL parser,
        // so textual variants of the same resource share one entry.
        let a = Url::parse("https://Example.COM/a.png").unwrap();
        let b = Url::parse("https://example.com:443/a.png").unwrap();
        assert_eq!(CacheKey::from_url(&a), CacheKey::from_url(&b));
    }

    #[test]
    fn test_key_is_filename_safe_hex() {
        let url = Url::parse("https://example.com/a?q=1&r=2").unwrap();
        let key = CacheKey::from_url(&url);
        assert_eq!(key.as_str().len(), 32);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
