//! # Builder for WebstashConfig
//!
//! Fluent API for creating and customizing [`WebstashConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use webstash::WebstashConfig;
//!
//! let config = WebstashConfig::builder()
//!     .with_cache_dir("/var/cache/myapp")
//!     .with_default_ttl_hours(24)
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("MyApp/1.0")
//!     .build();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::WebstashConfig;

/// Builder for creating [`WebstashConfig`] instances with a fluent API
#[derive(Debug, Clone)]
pub struct WebstashConfigBuilder {
    config: WebstashConfig,
}

impl WebstashConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: WebstashConfig::default(),
        }
    }

    /// Set the root directory for the disk cache
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    /// Set the default TTL in hours for cached entries
    pub fn with_default_ttl_hours(mut self, hours: u32) -> Self {
        self.config.default_ttl_hours = hours;
        self
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Build the [`WebstashConfig`] instance
    pub fn build(self) -> WebstashConfig {
        self.config
    }
}

impl Default for WebstashConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
