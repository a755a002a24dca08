//! Query result cache.
//!
//! Results are stored as JSON under the identity of the query that produced
//! them (`path?parameters`). Entries expire after the configured TTL and are
//! dropped by prefix whenever the data behind them changes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct Entry {
    value: Value,
    stored_at: Instant,
}

pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache key for `path` and its parameters. Parameter order does not matter.
    pub fn key(path: &str, params: &[(&str, &str)]) -> String {
        let mut params: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
        params.sort();
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the cached value for `key`, running `fetch` on a miss.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            tracing::trace!(key, "query cache hit");
            return Ok(hit);
        }
        let value = fetch().await?;
        self.insert(key, &value);
        Ok(value)
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many went.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn key_ignores_parameter_order_and_empty_values() {
        let a = QueryCache::key("/api/contracts", &[("status", "active"), ("clientId", "c1")]);
        let b = QueryCache::key(
            "/api/contracts",
            &[("clientId", "c1"), ("type", ""), ("status", "active")],
        );
        assert_eq!(a, b);
        assert_eq!(a, "/api/contracts?clientId=c1&status=active");
    }

    #[tokio::test]
    async fn fetches_once_per_key() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let v: Result<u32, ()> = cache
                .get_or_fetch("/panel?tab=overview", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(v, Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let first: Result<u32, &str> = cache.get_or_fetch("k?", || async { Err("down") }).await;
        assert!(first.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_miss() {
        let cache = QueryCache::new(Duration::ZERO);
        cache.insert("k?", &1_u32);
        assert_eq!(cache.get::<u32>("k?"), None);
    }

    #[test]
    fn invalidates_by_prefix() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.insert("/api/contracts?", &1_u32);
        cache.insert("/api/contracts?status=active", &2_u32);
        cache.insert("/api/contract-templates?", &3_u32);
        assert_eq!(cache.invalidate_prefix("/api/contracts?"), 2);
        assert_eq!(cache.get::<u32>("/api/contract-templates?"), Some(3));
    }
}
