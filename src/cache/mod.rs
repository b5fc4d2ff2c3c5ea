//! Result cache: memoizes analyses by [`CacheKey`] with a fixed TTL.
//!
//! Backends only move opaque payload strings. [`ResultCache`] owns the
//! (de)serialization and absorbs every backend failure, so callers see a miss
//! or a degraded write, never an error.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use futures::future::BoxFuture;

use crate::{analysis::classifier::CacheKey, domain::AnalysisResult};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Shared key/value store with per-entry expiry. Implementations must be
/// safe for concurrent use; last writer wins.
pub trait CacheStore: Send + Sync {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

    fn store<'a>(
        &'a self,
        key: &'a str,
        payload: String,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<()>>;

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Degraded,
}

#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let payload = match self.store.load(key.as_str()).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!(target: "cache", key = %key, "cache miss");
                return None;
            }
            Err(err) => {
                tracing::error!(target: "cache", key = %key, error = %err, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str::<AnalysisResult>(&payload) {
            Ok(result) => {
                tracing::info!(target: "cache", key = %key, "cache hit");
                Some(result)
            }
            Err(err) => {
                tracing::warn!(
                    target: "cache",
                    key = %key,
                    error = %err,
                    "discarding malformed cache entry"
                );
                None
            }
        }
    }

    pub async fn put(&self, key: &CacheKey, value: &AnalysisResult) -> CacheWrite {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(target: "cache", key = %key, error = %err, "cache encode failed");
                return CacheWrite::Degraded;
            }
        };

        match self.store.store(key.as_str(), payload, self.ttl).await {
            Ok(()) => {
                tracing::info!(target: "cache", key = %key, "result cached");
                CacheWrite::Stored
            }
            Err(err) => {
                tracing::error!(target: "cache", key = %key, error = %err, "cache write failed");
                CacheWrite::Degraded
            }
        }
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
