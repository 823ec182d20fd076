//! Integration tests for firepush-cache

use firepush_cache::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_trait_object_store() {
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());

    set(store.as_ref(), "fcm-http-v1-oauth-token-demo", &"ya29.a", None)
        .await
        .unwrap();
    let token: Option<String> = get(store.as_ref(), "fcm-http-v1-oauth-token-demo")
        .await
        .unwrap();

    assert_eq!(token.as_deref(), Some("ya29.a"));
}

#[tokio::test(start_paused = true)]
async fn test_remember_through_trait_object() {
    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
    let ttl = Duration::from_secs(30);

    let first: String = remember(store.as_ref(), "k", ttl, || async {
        Ok::<_, CacheError>("first".to_string())
    })
    .await
    .unwrap();
    let second: String = remember(store.as_ref(), "k", ttl, || async {
        Ok::<_, CacheError>("second".to_string())
    })
    .await
    .unwrap();
    assert_eq!(first, "first");
    assert_eq!(second, "first");

    tokio::time::advance(Duration::from_secs(31)).await;

    let third: String = remember(store.as_ref(), "k", ttl, || async {
        Ok::<_, CacheError>("third".to_string())
    })
    .await
    .unwrap();
    assert_eq!(third, "third");
}

#[test]
fn test_cache_error_display() {
    let err = CacheError::Connection("refused".to_string());
    assert!(err.to_string().contains("refused"));
}
