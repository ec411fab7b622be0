use serde::{Deserialize, Serialize};

/// Sidecar metadata for a cached blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Unix timestamp (seconds) of the last successful store.
    pub stored_at: u64,
    /// Size of the blob in bytes.
    pub size: u64,
}

impl EntryMetadata {
    /// Create metadata stamped with the current wall-clock time.
    pub fn new(size: u64) -> Self {
        Self {
            stored_at: unix_now(),
            size,
        }
    }

    /// TTL check: an entry is fresh while the elapsed duration since it was
    /// stored stays strictly below the configured timeout. Computed as a
    /// continuous duration between absolute timestamps, never calendar
    /// field arithmetic. A `ttl_hours` of 0 means "always revalidate".
    pub fn is_fresh(&self, ttl_hours: u32, now: u64) -> bool {
        if ttl_hours == 0 {
            return false;
        }
        now.saturating_sub(self.stored_at) < u64::from(ttl_hours) * 3600
    }
}

/// Current wall-clock time as unix seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
