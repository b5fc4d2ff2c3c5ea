use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::CacheStore;

const PURGE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct MemoryEntry {
    payload: String,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped on read, and swept in bulk
/// once the map grows past a threshold.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, payload: String, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.len() >= PURGE_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            key.to_string(),
            MemoryEntry {
                payload,
                expires_at: now + ttl,
            },
        );
    }
}

impl CacheStore for MemoryStore {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move { Ok(self.get(key)) })
    }

    fn store<'a>(
        &'a self,
        key: &'a str,
        payload: String,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.insert(key, payload, ttl);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        analysis::classifier::CacheKey,
        cache::ResultCache,
        config::DEFAULT_CACHE_TTL,
        domain::{AnalysisResult, TrustScore},
    };

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .store("k", "v".to_string(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.load("k").await.unwrap(), None);
        assert_eq!(store.entries.lock().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn results_live_for_a_day() {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()), DEFAULT_CACHE_TTL);
        let key = CacheKey::for_url("https://example.com/a");
        let result = AnalysisResult::new(
            TrustScore::clamped(80),
            "Looks fine",
            "https://example.com/a",
            Vec::new(),
        );
        cache.put(&key, &result).await;

        tokio::time::advance(Duration::from_secs(23 * 60 * 60)).await;
        assert_eq!(cache.get(&key).await, Some(result));

        tokio::time::advance(Duration::from_secs(2 * 60 * 60)).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.store("k", "first".to_string(), ttl).await.unwrap();
        store.store("k", "second".to_string(), ttl).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_corrupt() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .store("shared", format!("payload-{i}"), Duration::from_secs(60))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let value = store.load("shared").await.unwrap().unwrap();
        assert!(value.starts_with("payload-"));
        assert_eq!(store.entries.lock().len(), 1);
    }
}
