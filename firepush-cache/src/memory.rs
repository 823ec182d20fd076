//! Process-local cache store.

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// In-memory cache backed by a `HashMap`.
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

impl InMemoryCache {
    /// Create new in-memory cache
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let mut data = self.data.write().await;
        let now = Instant::now();
        data.retain(|_, entry| entry.is_live(now));
    }

    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the cache holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        let entry = CacheEntry { value, expires_at };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let data = self.data.read().await;
        let now = Instant::now();
        Ok(data
            .get(key)
            .and_then(|entry| entry.expires_at)
            .filter(|expires_at| *expires_at > now)
            .map(|expires_at| expires_at - now))
    }

    async fn clear(&self) -> CacheResult<()> {
        self.data.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache
            .set_json("token", "\"abc\"".to_string(), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get_json("token").await.unwrap(),
            Some("\"abc\"".to_string())
        );
        assert!(cache.exists("token").await.unwrap());
        assert!(!cache.exists("missing").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set_json("token", "v".to_string(), Some(Duration::from_secs(10)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get_json("token").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get_json("token").await.unwrap().is_none());
        assert_eq!(cache.ttl("token").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_reports_remaining_time() {
        let cache = InMemoryCache::new();
        cache
            .set_json("token", "v".to_string(), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;

        assert_eq!(
            cache.ttl("token").await.unwrap(),
            Some(Duration::from_secs(45))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = InMemoryCache::new();
        cache
            .set_json("short", "1".to_string(), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        cache.set_json("forever", "2".to_string(), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        cache.purge_expired().await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.exists("forever").await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = InMemoryCache::new();
        let other = cache.clone();
        cache.set_json("k", "v".to_string(), None).await.unwrap();

        assert!(other.exists("k").await.unwrap());
        other.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
