//! Short-lived memory of upstream answers
//!
//! Only successful answers are ever stored. Callers check the cache, go
//! upstream on a miss and call [`ResponseCache::store`] once the answer is
//! known to be good, so a failed fetch leaves nothing behind.

use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What an upstream answer is for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full daily history of a ticker
    History { symbol: String },
    /// Symbol search results, capped at `limit` matches
    Lookup { query: String, limit: usize },
}

impl CacheKey {
    /// Tickers are case-insensitive
    pub fn history(symbol: &str) -> Self {
        Self::History {
            symbol: symbol.trim().to_uppercase(),
        }
    }

    /// Queries are case-insensitive; the same text with a different cap is a
    /// different answer
    pub fn lookup(query: &str, limit: usize) -> Self {
        Self::Lookup {
            query: query.trim().to_lowercase(),
            limit,
        }
    }
}

/// Answers kept for a fixed time-to-live, shared between clones
pub struct ResponseCache<V> {
    entries: Arc<Mutex<TimedCache<CacheKey, V>>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(TimedCache::with_lifespan(ttl))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired answer for `key`
    pub async fn lookup(&self, key: &CacheKey) -> Option<V> {
        self.entries.lock().await.cache_get(key).cloned()
    }

    /// Remember a good answer
    pub async fn store(&self, key: CacheKey, value: V) {
        self.entries.lock().await.cache_set(key, value);
    }
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_ignore_case() {
        assert_eq!(CacheKey::history(" aapl"), CacheKey::history("AAPL"));
        assert_eq!(CacheKey::lookup("Apple ", 10), CacheKey::lookup("apple", 10));
        assert_ne!(CacheKey::lookup("apple", 10), CacheKey::lookup("apple", 5));
        assert_ne!(CacheKey::history("apple"), CacheKey::lookup("apple", 10));
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::history("MSFT");

        assert_eq!(cache.lookup(&key).await, None);
        cache.store(key.clone(), vec![1.0, 2.0]).await;
        assert_eq!(cache.lookup(&key).await, Some(vec![1.0, 2.0]));
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let shared = cache.clone();

        shared.store(CacheKey::lookup("tesla", 3), "TSLA").await;
        assert_eq!(cache.lookup(&CacheKey::lookup("TESLA", 3)).await, Some("TSLA"));
    }
}
