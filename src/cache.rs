use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

pub const PRODUCT_LISTING_PREFIX: &str = "products:";

/// Key/value store for rendered product listings.
#[async_trait]
pub trait ProductCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn put(&self, key: String, value: Value);

    /// Drops every entry whose key starts with `prefix`.
    async fn invalidate(&self, prefix: &str);
}

#[derive(Debug)]
pub struct MemoryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Value)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ProductCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                    debug!(key, "Cache hit");
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired. Re-check under the write lock, a concurrent put may have
        // refreshed it.
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|(stored_at, _)| stored_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
        }
        None
    }

    async fn put(&self, key: String, value: Value) {
        debug!(key = %key, ttl = ?self.ttl, "Caching response");
        self.entries
            .write()
            .await
            .insert(key, (Instant::now(), value));
    }

    async fn invalidate(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!(prefix, evicted = before - entries.len(), "Cache invalidated");
    }
}
