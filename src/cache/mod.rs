//! Short-lived key/value state: OTP entries, password reset tokens, the
//! refresh-token blacklist and per-user preferences.
//!
//! Two interchangeable backends implement [`CacheBackend`]: an in-process
//! [`InMemoryCache`] for single-node deployments and tests, and [`RedisCache`]
//! when several API nodes must share the same state.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Invalid TTL")]
    InvalidTTL,
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

/// Reads and deserializes a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheBackend,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes and stores a JSON value.
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl).await
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Instant::now() >= expires_at)
            .unwrap_or(false)
    }
}

/// In-process cache; expired entries are dropped lazily on access.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) {
        self.store.retain(|_, entry| !entry.is_expired());
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.store.remove_if(key, |_, entry| entry.is_expired()).is_some() {
            return Ok(None);
        }
        Ok(self.store.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        if ttl.is_some_and(|d| d.is_zero()) {
            return Err(CacheError::InvalidTTL);
        }
        self.store
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear();
        Ok(())
    }
}

/// Redis-backed cache. Keys are namespaced so `clear` only touches this service's keys.
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
    namespace: String,
}

impl RedisCache {
    pub async fn connect(redis_url: &str, namespace: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            namespace: namespace.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(self.key(key))
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(key)).arg(value);
        if let Some(ttl) = ttl {
            let secs = ttl.as_secs();
            if secs == 0 {
                return Err(CacheError::InvalidTTL);
            }
            cmd.arg("EX").arg(secs);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let count = redis::cmd("EXISTS")
            .arg(self.key(key))
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(count > 0)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let keys = redis::cmd("KEYS")
            .arg(format!("{}:*", self.namespace))
            .query_async::<_, Vec<String>>(&mut conn)
            .await?;
        if keys.is_empty() {
            return Ok(());
        }
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Builds the backend selected by `cache_backend`.
pub async fn create_cache(config: &AppConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    if config.uses_redis_cache() {
        let url = config.redis_url.as_deref().ok_or_else(|| {
            CacheError::OperationFailed("redis_url is required for the redis backend".into())
        })?;
        tracing::info!("Using Redis cache backend");
        return Ok(Arc::new(RedisCache::connect(url, "storefront").await?));
    }
    tracing::info!("Using in-memory cache backend");
    Ok(Arc::new(InMemoryCache::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        attempts: u32,
    }

    #[tokio::test]
    async fn set_get_delete() {
        let cache = InMemoryCache::new();
        cache.set("otp_signup_9876543210", "x", None).await.unwrap();
        assert_eq!(
            cache.get("otp_signup_9876543210").await.unwrap().as_deref(),
            Some("x")
        );
        assert!(cache.exists("otp_signup_9876543210").await.unwrap());

        cache.delete("otp_signup_9876543210").await.unwrap();
        assert_eq!(cache.get("otp_signup_9876543210").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let cache = InMemoryCache::new();
        let err = cache.set("k", "v", Some(Duration::ZERO)).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidTTL));
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let cache = InMemoryCache::new();
        cache
            .set("gone", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        cache.set("kept", "v", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn json_helpers_round_trip_through_dyn_backend() {
        let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new());
        set_json(cache.as_ref(), "entry", &Entry { attempts: 2 }, None)
            .await
            .unwrap();
        let loaded: Option<Entry> = get_json(cache.as_ref(), "entry").await.unwrap();
        assert_eq!(loaded, Some(Entry { attempts: 2 }));

        let missing: Option<Entry> = get_json(cache.as_ref(), "nope").await.unwrap();
        assert!(missing.is_none());
    }
}
