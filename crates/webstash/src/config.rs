use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Default TTL applied to requests that do not set their own, in hours.
pub const DEFAULT_TTL_HOURS: u32 = 72;

/// Configurable options for a [`Webstash`](crate::Webstash) service.
#[derive(Debug, Clone)]
pub struct WebstashConfig {
    /// Root directory for the disk cache.
    pub cache_dir: PathBuf,

    /// Default TTL in hours for cached entries.
    pub default_ttl_hours: u32,

    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for WebstashConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("webstash-cache"),
            default_ttl_hours: DEFAULT_TTL_HOURS,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: WebstashConfig::get_default_headers(),
        }
    }
}

impl WebstashConfig {
    pub fn builder() -> crate::builder::WebstashConfigBuilder {
        crate::builder::WebstashConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("image/*,application/json,text/plain,*/*;q=0.8"),
        );

        default_headers
    }
}
