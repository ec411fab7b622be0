//! # In-Flight Registry
//!
//! Single-flight bookkeeping for active downloads. The first caller to claim
//! a key becomes its leader and performs the one network fetch; every caller
//! arriving before the leader's terminal transition subscribes to the same
//! broadcast and receives the leader's outcome.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::cache::CacheKey;
use crate::error::FetchError;

/// Terminal outcome of a download, fanned out to every waiter on the key.
pub type FetchOutcome = Result<Bytes, Arc<FetchError>>;

// One terminal message per flight; a small buffer absorbs subscribe races.
const CHANNEL_CAPACITY: usize = 4;

/// Result of claiming a key.
pub enum FlightSlot {
    /// This caller owns the download and must publish the outcome.
    Leader(broadcast::Sender<FetchOutcome>),
    /// Another caller is already downloading this key.
    Follower(broadcast::Receiver<FetchOutcome>),
}

#[derive(Debug, Default)]
pub struct InflightRegistry {
    inner: Mutex<HashMap<CacheKey, broadcast::Sender<FetchOutcome>>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim the key, or subscribe to the flight already holding
    /// it.
    pub fn claim(&self, key: &CacheKey) -> FlightSlot {
        let mut map = self.inner.lock();
        if let Some(sender) = map.get(key) {
            return FlightSlot::Follower(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        map.insert(key.clone(), sender.clone());
        FlightSlot::Leader(sender)
    }

    /// Publish the outcome and release the key. Removal happens regardless of
    /// success or failure so a failed download never wedges the key.
    pub fn complete(&self, key: &CacheKey, outcome: FetchOutcome) {
        let sender = self.inner.lock().remove(key);
        if let Some(sender) = sender {
            // No receivers just means nobody waited; that is fine.
            let _ = sender.send(outcome);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn test_key(name: &str) -> CacheKey {
        let url = Url::parse(&format!("https://example.com/{name}")).unwrap();
        CacheKey::from_url(&url)
    }

    #[test]
    fn test_first_claim_is_leader() {
        let registry = InflightRegistry::new();
        let slot = registry.claim(&test_key("a"));

        assert!(matches!(slot, FlightSlot::Leader(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_second_claim_is_follower() {
        let registry = InflightRegistry::new();
        let key = test_key("a");

        let _leader = registry.claim(&key);
        let slot = registry.claim(&key);

        assert!(matches!(slot, FlightSlot::Follower(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_different_keys_are_independent_leaders() {
        let registry = InflightRegistry::new();

        assert!(matches!(registry.claim(&test_key("a")), FlightSlot::Leader(_)));
        assert!(matches!(registry.claim(&test_key("b")), FlightSlot::Leader(_)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_complete_releases_key() {
        let registry = InflightRegistry::new();
        let key = test_key("a");

        let _slot = registry.claim(&key);
        registry.complete(&key, Ok(Bytes::from_static(b"x")));

        assert!(registry.is_empty());
        // The key can be claimed again by a new leader
        assert!(matches!(registry.claim(&key), FlightSlot::Leader(_)));
    }

    #[test]
    fn test_complete_unclaimed_key_is_noop() {
        let registry = InflightRegistry::new();
        registry.complete(&test_key("ghost"), Ok(Bytes::new()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_followers_receive_leader_outcome() {
        let registry = InflightRegistry::new();
        let key = test_key("a");

        let sender = match registry.claim(&key) {
            FlightSlot::Leader(s) => s,
            FlightSlot::Follower(_) => panic!("expected leader"),
        };
        let mut rx1 = match registry.claim(&key) {
            FlightSlot::Follower(r) => r,
            FlightSlot::Leader(_) => panic!("expected follower"),
        };
        let mut rx2 = match registry.claim(&key) {
            FlightSlot::Follower(r) => r,
            FlightSlot::Leader(_) => panic!("expected follower"),
        };
        drop(sender);

        registry.complete(&key, Ok(Bytes::from_static(b"payload")));

        assert_eq!(rx1.recv().await.unwrap().unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(rx2.recv().await.unwrap().unwrap(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_followers_receive_failure() {
        let registry = InflightRegistry::new();
        let key = test_key("a");

        let _leader = registry.claim(&key);
        let mut rx = match registry.claim(&key) {
            FlightSlot::Follower(r) => r,
            FlightSlot::Leader(_) => panic!("expected follower"),
        };

        let err = Arc::new(FetchError::Transport("network unreachable".into()));
        registry.complete(&key, Err(err));

        let outcome = rx.recv().await.unwrap();
        assert!(outcome.unwrap_err().to_string().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_concurrent_claims_elect_single_leader() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = Arc::new(InflightRegistry::new());
        let leaders = Arc::new(AtomicUsize::new(0));
        let followers = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..20u64 {
            let registry = Arc::clone(&registry);
            let leaders = Arc::clone(&leaders);
            let followers = Arc::clone(&followers);
            let key = test_key("contended");

            handles.push(tokio::spawn(async move {
                tokio::time::sleep(tokio::time::Duration::from_micros(i * 10)).await;
                match registry.claim(&key) {
                    FlightSlot::Leader(_) => leaders.fetch_add(1, Ordering::SeqCst),
                    FlightSlot::Follower(_) => followers.fetch_add(1, Ordering::SeqCst),
                };
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(leaders.load(Ordering::SeqCst), 1);
        assert_eq!(followers.load(Ordering::SeqCst), 19);
    }
}
