//! # Fetch Coordinator
//!
//! [`Webstash`] drives a fetch request end-to-end: input validation, cache
//! and TTL resolution, single-flight download leadership, persistence and
//! the callback delivery lifecycle. The service is explicitly constructed
//! and owned; it holds the in-flight registry, the cache store and the
//! transport, and releases everything on drop.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheKey, CacheStore, unix_now};
use crate::config::WebstashConfig;
use crate::error::FetchError;
use crate::inflight::{FetchOutcome, FlightSlot, InflightRegistry};
use crate::request::{Callback, EncodeFormat, FetchRequest, Payload, PayloadKind};
use crate::transport::{HttpTransport, Transport};

/// The fetch/cache coordination service.
pub struct Webstash {
    config: WebstashConfig,
    store: Arc<CacheStore>,
    registry: Arc<InflightRegistry>,
    transport: Arc<dyn Transport>,
}

impl Webstash {
    /// Create a service with the HTTP transport.
    pub fn new(config: WebstashConfig) -> Result<Self, FetchError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a service with a custom transport.
    pub fn with_transport(config: WebstashConfig, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(CacheStore::new(config.cache_dir.clone()));
        Self {
            config,
            store,
            registry: Arc::new(InflightRegistry::new()),
            transport,
        }
    }

    pub fn config(&self) -> &WebstashConfig {
        &self.config
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Process a fetch request to completion, serving from cache when a
    /// fresh entry exists and downloading otherwise. Returns the delivered
    /// payload; every configured callback fires along the way.
    pub async fn fetch(&self, request: FetchRequest) -> Result<Payload, FetchError> {
        self.run(request, None, false).await
    }

    /// Force a re-download of the request's URL, or of `url_override` when
    /// given, bypassing any fresh cache entry. The result is persisted as
    /// usual.
    pub async fn refresh(
        &self,
        request: FetchRequest,
        url_override: Option<&str>,
    ) -> Result<Payload, FetchError> {
        self.run(request, url_override, true).await
    }

    /// Whether a complete cache entry exists for the URL, disregarding TTL.
    pub async fn is_cached(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        let key = CacheKey::from_url(&url);
        self.store.exists(&key).await.unwrap_or(false)
    }

    /// Remove the cached entry for a URL. Safe to call while fetches are in
    /// flight; a racing write may recreate the entry (last writer wins).
    pub async fn clear_entry(&self, url: &str) -> Result<(), FetchError> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::InvalidInput(format!("url is not valid: {e}")))?;
        self.store.delete(&CacheKey::from_url(&url)).await?;
        info!(url = %url, "cleared cache entry");
        Ok(())
    }

    /// Remove every cached entry and its metadata.
    pub async fn clear_all(&self) -> Result<(), FetchError> {
        self.store.clear_all().await?;
        info!("cleared all cache entries");
        Ok(())
    }

    async fn run(
        &self,
        request: FetchRequest,
        url_override: Option<&str>,
        force: bool,
    ) -> Result<Payload, FetchError> {
        // VALIDATING
        let url = match validate(&request, url_override) {
            Ok(url) => url,
            Err(e) => return fail_invalid(&request, e),
        };

        fire(&request.on_start);
        if let (Some(sink), Some(placeholder)) = (&request.sink, &request.loading_placeholder) {
            sink.apply(&payload_for(&request, &url, placeholder.clone()));
        }

        let key = CacheKey::from_url(&url);
        let ttl_hours = request.ttl_hours.unwrap_or(self.config.default_ttl_hours);

        // SERVING_CACHED
        if request.use_cache && !force {
            if let Some(bytes) = self.try_serve_cached(&key, ttl_hours).await {
                debug!(url = %url, key = %key, "serving from cache");
                fire(&request.on_already_cached);
                return self.deliver(&request, &url, &key, bytes).await;
            }
        }

        // AWAITING_PEER / DOWNLOADING
        let outcome = match self.registry.claim(&key) {
            FlightSlot::Follower(mut receiver) => {
                debug!(url = %url, key = %key, "awaiting in-flight download for the same key");
                match receiver.recv().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(Arc::new(FetchError::Transport(
                        "in-flight download terminated without an outcome".into(),
                    ))),
                }
            }
            FlightSlot::Leader(_) => self.download(&request, &url, &key).await,
        };

        match outcome {
            Ok(bytes) => {
                fire(&request.on_downloaded);
                self.deliver(&request, &url, &key, bytes).await
            }
            Err(err) => fail_transport(&request, &url, err),
        }
    }

    /// Run the sole download for a claimed key. The work happens in a
    /// detached task: waiters and the cache write depend on it, so an
    /// abandoned caller must not cancel it.
    async fn download(&self, request: &FetchRequest, url: &Url, key: &CacheKey) -> FetchOutcome {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let on_progress = request.on_progress.clone();
        let kind = request.kind;
        let task_url = url.clone();
        let task_key = key.clone();

        debug!(url = %url, key = %key, "download started");

        let task = tokio::spawn(async move {
            let outcome: FetchOutcome =
                match transport.fetch(&task_url, kind, on_progress.as_ref()).await {
                    Ok(bytes) => {
                        // Cache persistence is best-effort: a failed write
                        // still delivers the in-memory payload.
                        if let Err(e) = store.write(&task_key, &bytes).await {
                            warn!(key = %task_key, error = %e, "failed to persist downloaded payload");
                        }
                        Ok(bytes)
                    }
                    Err(e) => Err(Arc::new(e)),
                };
            registry.complete(&task_key, outcome.clone());
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The task died before publishing its outcome. Release the
                // key so waiters are notified and later fetches elect a new
                // leader instead of waiting on a dead flight.
                warn!(url = %url, key = %key, error = %e, "download task terminated abnormally");
                let err = Arc::new(FetchError::Transport(format!("download task failed: {e}")));
                self.registry.complete(key, Err(Arc::clone(&err)));
                Err(err)
            }
        }
    }

    /// Resolve the cache for a key: a fresh entry whose blob reads back
    /// cleanly, or `None` to fall through to a download.
    async fn try_serve_cached(&self, key: &CacheKey, ttl_hours: u32) -> Option<Bytes> {
        let meta = match self.store.read_metadata(key).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read cache metadata, treating as miss");
                return None;
            }
        };

        if !meta.is_fresh(ttl_hours, unix_now()) {
            debug!(key = %key, "cache entry expired");
            return None;
        }

        match self.store.read(key).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read cached blob, falling back to download");
                None
            }
        }
    }

    // DELIVERING
    async fn deliver(
        &self,
        request: &FetchRequest,
        url: &Url,
        key: &CacheKey,
        bytes: Bytes,
    ) -> Result<Payload, FetchError> {
        if let Some(callback) = &request.on_progress {
            callback(100);
        }

        let payload = payload_for(request, url, bytes);
        if let Some(sink) = &request.sink {
            sink.apply(&payload);
        }
        if payload.kind == PayloadKind::Text {
            if let Some(callback) = &request.on_response {
                callback(&payload.text());
            }
        }

        if !request.persist_after_use {
            if let Err(e) = self.store.delete(key).await {
                warn!(key = %key, error = %e, "failed to remove non-persistent cache entry");
            }
        }

        fire(&request.on_end);
        Ok(payload)
    }
}

fn validate(request: &FetchRequest, url_override: Option<&str>) -> Result<Url, FetchError> {
    let raw = url_override.unwrap_or(&request.url);
    if raw.trim().is_empty() {
        return Err(FetchError::InvalidInput("url has not been set".into()));
    }
    let url =
        Url::parse(raw).map_err(|e| FetchError::InvalidInput(format!("url is not valid: {e}")))?;
    if request.kind == PayloadKind::BinaryImage && request.sink.is_none() {
        return Err(FetchError::InvalidInput(
            "image request has no target sink".into(),
        ));
    }
    Ok(url)
}

fn payload_for(request: &FetchRequest, url: &Url, bytes: Bytes) -> Payload {
    let encode_format = match request.kind {
        PayloadKind::BinaryImage => Some(
            request
                .encode_format
                .unwrap_or_else(|| EncodeFormat::from_url(url)),
        ),
        PayloadKind::Text => None,
    };
    Payload {
        kind: request.kind,
        bytes,
        encode_format,
    }
}

fn fire(callback: &Option<Callback>) {
    if let Some(callback) = callback {
        callback();
    }
}

/// Terminal ERROR transition for malformed input. Never degrades to a
/// placeholder and is never retried.
fn fail_invalid(request: &FetchRequest, err: FetchError) -> Result<Payload, FetchError> {
    warn!(url = %request.url, error = %err, "rejecting fetch request");
    if let Some(callback) = &request.on_error {
        callback(&err.to_string());
    }
    fire(&request.on_end);
    Err(err)
}

/// Terminal ERROR transition for a failed download. With an error
/// placeholder configured the request degrades to a delivered placeholder
/// instead of terminating in failure.
fn fail_transport(
    request: &FetchRequest,
    url: &Url,
    err: Arc<FetchError>,
) -> Result<Payload, FetchError> {
    let message = err.to_string();
    warn!(url = %url, error = %message, "download failed");
    if let Some(callback) = &request.on_error {
        callback(&message);
    }

    if let Some(placeholder) = &request.error_placeholder {
        let payload = payload_for(request, url, placeholder.clone());
        if let Some(sink) = &request.sink {
            sink.apply(&payload);
        }
        fire(&request.on_end);
        return Ok(payload);
    }

    fire(&request.on_end);
    Err(FetchError::Shared(err))
}
