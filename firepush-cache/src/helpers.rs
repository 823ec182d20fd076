//! Helper functions for common cache operations.

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Get a typed value from the cache.
pub async fn get<S, T>(store: &S, key: &str) -> CacheResult<Option<T>>
where
    S: CacheStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get_json(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| CacheError::Deserialization(e.to_string())),
        None => Ok(None),
    }
}

/// Set a typed value in the cache.
pub async fn set<S, T>(store: &S, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
where
    S: CacheStore + ?Sized,
    T: Serialize,
{
    let json = serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    store.set_json(key, json, ttl).await
}

/// Remember a value for a given duration.
///
/// If the key exists, returns the cached value. If not, calls the factory,
/// caches the result with `ttl`, and returns it. A factory error is
/// returned as-is and nothing is cached.
pub async fn remember<S, T, E, F, Fut>(store: &S, key: &str, ttl: Duration, factory: F) -> Result<T, E>
where
    S: CacheStore + ?Sized,
    T: Serialize + DeserializeOwned,
    E: From<CacheError>,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    remember_for(store, key, || async move { Ok::<_, E>((factory().await?, ttl)) }).await
}

/// Like [`remember`], but the factory picks the TTL along with the value.
///
/// A zero TTL hands the value back without caching it.
pub async fn remember_for<S, T, E, F, Fut>(store: &S, key: &str, factory: F) -> Result<T, E>
where
    S: CacheStore + ?Sized,
    T: Serialize + DeserializeOwned,
    E: From<CacheError>,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(T, Duration), E>>,
{
    if let Some(value) = get(store, key).await? {
        return Ok(value);
    }

    let (value, ttl) = factory().await?;
    if !ttl.is_zero() {
        set(store, key, &value, Some(ttl)).await?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = InMemoryCache::new();
        set(&cache, "ids", &vec![1u32, 2, 3], None).await.unwrap();

        let ids: Option<Vec<u32>> = get(&cache, "ids").await.unwrap();
        assert_eq!(ids, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_get_rejects_mismatched_type() {
        let cache = InMemoryCache::new();
        cache
            .set_json("ids", "\"not a list\"".to_string(), None)
            .await
            .unwrap();

        let result: CacheResult<Option<Vec<u32>>> = get(&cache, "ids").await;
        assert!(matches!(result, Err(CacheError::Deserialization(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remember_calls_factory_once_until_expiry() {
        let cache = InMemoryCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let ttl = Duration::from_secs(3500);

        for _ in 0..3 {
            let value: String = remember(&cache, "tok", ttl, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>("fresh".to_string())
            })
            .await
            .unwrap();
            assert_eq!(value, "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3501)).await;

        let _: String = remember(&cache, "tok", ttl, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CacheError>("refreshed".to_string())
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remember_does_not_cache_failures() {
        let cache = InMemoryCache::new();

        let result: Result<String, CacheError> =
            remember(&cache, "tok", Duration::from_secs(60), || async {
                Err(CacheError::Fill("token endpoint down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(!cache.exists("tok").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remember_for_uses_factory_ttl() {
        let cache = InMemoryCache::new();

        let value: String = remember_for(&cache, "tok", || async {
            Ok::<_, CacheError>(("short".to_string(), Duration::from_secs(30)))
        })
        .await
        .unwrap();
        assert_eq!(value, "short");
        assert!(cache.exists("tok").await.unwrap());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!cache.exists("tok").await.unwrap());
    }

    #[tokio::test]
    async fn test_remember_for_zero_ttl_skips_cache() {
        let cache = InMemoryCache::new();

        let value: String = remember_for(&cache, "tok", || async {
            Ok::<_, CacheError>(("once".to_string(), Duration::ZERO))
        })
        .await
        .unwrap();

        assert_eq!(value, "once");
        assert!(!cache.exists("tok").await.unwrap());
    }
}
