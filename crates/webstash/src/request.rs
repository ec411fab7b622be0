//! # Fetch Requests
//!
//! Per-request configuration, callbacks and payload types. A request is
//! assembled with a fluent builder, submitted to
//! [`Webstash::fetch`](crate::Webstash::fetch) and processed to completion
//! exactly once.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::sink::PayloadSink;

/// What the bytes coming back from the network represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Binary image payload, handed to the attached sink for decoding.
    BinaryImage,
    /// Text payload (JSON, plain text).
    Text,
}

/// Encode format recorded for image payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    Png,
    Jpeg,
}

impl EncodeFormat {
    /// Infer the format from the URL path extension. `.png` maps to
    /// [`EncodeFormat::Png`], everything else to [`EncodeFormat::Jpeg`].
    pub fn from_url(url: &Url) -> Self {
        if url.path().to_ascii_lowercase().ends_with(".png") {
            EncodeFormat::Png
        } else {
            EncodeFormat::Jpeg
        }
    }
}

/// A fetched payload, handed to sinks and returned from fetch operations.
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: PayloadKind,
    pub bytes: Bytes,
    /// Set for image payloads, `None` for text.
    pub encode_format: Option<EncodeFormat>,
}

impl Payload {
    /// The payload interpreted as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// A parameterless lifecycle callback.
pub type Callback = Arc<dyn Fn() + Send + Sync>;
/// A callback for download progress updates, in whole percentages 0..=100.
pub type OnProgress = Arc<dyn Fn(u8) + Send + Sync>;
/// A callback receiving a human-readable failure message.
pub type OnError = Arc<dyn Fn(&str) + Send + Sync>;
/// A callback receiving the downloaded text payload.
pub type OnResponse = Arc<dyn Fn(&str) + Send + Sync>;

/// A single fetch request. Immutable once built.
#[derive(Clone)]
pub struct FetchRequest {
    pub(crate) url: String,
    pub(crate) kind: PayloadKind,
    pub(crate) use_cache: bool,
    pub(crate) ttl_hours: Option<u32>,
    pub(crate) persist_after_use: bool,
    pub(crate) encode_format: Option<EncodeFormat>,
    pub(crate) sink: Option<Arc<dyn PayloadSink>>,
    pub(crate) loading_placeholder: Option<Bytes>,
    pub(crate) error_placeholder: Option<Bytes>,
    pub(crate) on_start: Option<Callback>,
    pub(crate) on_downloaded: Option<Callback>,
    pub(crate) on_already_cached: Option<Callback>,
    pub(crate) on_end: Option<Callback>,
    pub(crate) on_progress: Option<OnProgress>,
    pub(crate) on_error: Option<OnError>,
    pub(crate) on_response: Option<OnResponse>,
}

impl FetchRequest {
    /// Start building an image request for the given URL.
    pub fn image(url: impl Into<String>) -> FetchRequestBuilder {
        FetchRequestBuilder::new(url, PayloadKind::BinaryImage)
    }

    /// Start building a text request for the given URL.
    pub fn text(url: impl Into<String>) -> FetchRequestBuilder {
        FetchRequestBuilder::new(url, PayloadKind::Text)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }
}

/// Builder for [`FetchRequest`] instances with a fluent API
pub struct FetchRequestBuilder {
    request: FetchRequest,
}

impl FetchRequestBuilder {
    pub fn new(url: impl Into<String>, kind: PayloadKind) -> Self {
        Self {
            request: FetchRequest {
                url: url.into(),
                kind,
                use_cache: true,
                ttl_hours: None,
                persist_after_use: true,
                encode_format: None,
                sink: None,
                loading_placeholder: None,
                error_placeholder: None,
                on_start: None,
                on_downloaded: None,
                on_already_cached: None,
                on_end: None,
                on_progress: None,
                on_error: None,
                on_response: None,
            },
        }
    }

    /// Attach the delivery sink. Required for image requests.
    pub fn into_sink(mut self, sink: Arc<dyn PayloadSink>) -> Self {
        self.request.sink = Some(sink);
        self
    }

    /// Enable or disable serving this request from cache
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.request.use_cache = use_cache;
        self
    }

    /// Override the service-wide TTL for this request, in hours. Zero means
    /// "always revalidate".
    pub fn with_ttl_hours(mut self, hours: u32) -> Self {
        self.request.ttl_hours = Some(hours);
        self
    }

    /// When false, the cache entry is deleted after the request completes
    pub fn with_persist_after_use(mut self, persist: bool) -> Self {
        self.request.persist_after_use = persist;
        self
    }

    /// Force the encode format instead of inferring it from the URL
    pub fn with_encode_format(mut self, format: EncodeFormat) -> Self {
        self.request.encode_format = Some(format);
        self
    }

    /// Payload delivered to the sink before the fetch begins
    pub fn with_loading_placeholder(mut self, bytes: Bytes) -> Self {
        self.request.loading_placeholder = Some(bytes);
        self
    }

    /// Payload delivered as a degraded success when the transport fails
    pub fn with_error_placeholder(mut self, bytes: Bytes) -> Self {
        self.request.error_placeholder = Some(bytes);
        self
    }

    pub fn with_start_action(mut self, action: Callback) -> Self {
        self.request.on_start = Some(action);
        self
    }

    pub fn with_downloaded_action(mut self, action: Callback) -> Self {
        self.request.on_downloaded = Some(action);
        self
    }

    pub fn with_already_cached_action(mut self, action: Callback) -> Self {
        self.request.on_already_cached = Some(action);
        self
    }

    pub fn with_end_action(mut self, action: Callback) -> Self {
        self.request.on_end = Some(action);
        self
    }

    pub fn with_progress_action(mut self, action: OnProgress) -> Self {
        self.request.on_progress = Some(action);
        self
    }

    pub fn with_error_action(mut self, action: OnError) -> Self {
        self.request.on_error = Some(action);
        self
    }

    /// Callback receiving the downloaded text, for [`PayloadKind::Text`]
    /// requests.
    pub fn with_response_action(mut self, action: OnResponse) -> Self {
        self.request.on_response = Some(action);
        self
    }

    pub fn build(self) -> FetchRequest {
        self.request
    }
}
