//! # Webstash
//!
//! A library for fetching remote resources (images, text/JSON payloads)
//! over HTTP and caching them on disk.
//!
//! ## Features
//!
//! - Content-addressed disk cache with TTL-based invalidation
//! - Single-flight deduplication of concurrent requests for the same URL
//! - Optional per-request callbacks for the full fetch lifecycle
//! - Placeholder payloads for loading and error states

pub mod builder;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod inflight;
pub mod request;
pub mod sink;
pub mod transport;

pub use builder::WebstashConfigBuilder;
pub use cache::{CacheKey, CacheStore, EntryMetadata};
pub use config::WebstashConfig;
pub use coordinator::Webstash;
pub use error::FetchError;
pub use inflight::{FetchOutcome, FlightSlot, InflightRegistry};
pub use request::{
    Callback, EncodeFormat, FetchRequest, FetchRequestBuilder, OnError, OnProgress, OnResponse,
    Payload, PayloadKind,
};
pub use sink::{CallbackSink, PayloadSink};
pub use transport::{HttpTransport, Transport, create_client};
