//! # Cache System
//!
//! Disk-backed persistence for downloaded payloads. Blobs are stored under a
//! single root directory, named by the content-addressed key of their source
//! URL, with a sidecar `.meta` file carrying the last-stored timestamp used
//! for TTL validation.

mod key;
mod meta;
mod store;

pub use key::CacheKey;
pub use meta::EntryMetadata;
pub(crate) use meta::unix_now;
pub use store::CacheStore;
