//! Short-lived memoization of resolved lookups.
//!
//! Keys are canonical timestamp strings. Entries expire after a fixed TTL;
//! [`ResultCache::get`] never returns an expired value, while
//! [`ResultCache::sweep`] (run periodically by the facade) only reclaims
//! memory.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct CachedResult {
    message: String,
    expires_at: Instant,
}

/// Time-bounded cache of resolved log lines.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedResult>>,
}

impl ResultCache {
    /// Creates an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached message for `key` if it has not expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.message.clone())
    }

    /// Stores `message` under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, message: impl Into<String>) {
        let entry = CachedResult {
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of stored entries, including expired ones not yet
    /// swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry time to live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set("2023-01-01T00:00:01.000", "line2");

        assert_eq!(
            cache.get("2023-01-01T00:00:01.000").as_deref(),
            Some("line2")
        );
        assert!(cache.get("2023-01-01T00:00:02.000").is_none());
    }

    #[test]
    fn set_overwrites() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set("k", "first");
        cache.set("k", "second");

        assert_eq!(cache.get("k").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_not_returned_before_sweep() {
        let cache = ResultCache::new(Duration::from_millis(10));
        cache.set("k", "v");
        std::thread::sleep(Duration::from_millis(30));

        assert!(cache.get("k").is_none());
        // Still occupying memory until swept.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let cache = ResultCache::new(Duration::from_millis(20));
        cache.set("old", "v");
        std::thread::sleep(Duration::from_millis(40));
        cache.set("fresh", "v");

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.set("a", "1");
        cache.set("b", "2");
        cache.clear();
        assert!(cache.is_empty());
    }
}
