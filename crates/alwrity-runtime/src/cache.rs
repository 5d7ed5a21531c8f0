//! Expiring cache for planned outlines.
//!
//! Entries carry their insertion time from an injected [`Clock`], so expiry
//! is driven by the clock rather than by real timers. At capacity the oldest
//! entry is evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use alwrity_core::{Clock, Result};
use alwrity_providers::OutlineRequest;

struct CacheEntry<V> {
    value: V,
    inserted_at: i64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: Vec<String>,
    max_size: usize,
    ttl_millis: i64,
}

/// Thread-safe TTL cache keyed by string.
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_size: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size: max_size.max(1),
                ttl_millis: ttl.as_millis() as i64,
            }),
            clock,
        }
    }

    /// Cached value, or `None` on miss or expiry. Expired entries are dropped.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let expired = inner
            .entries
            .get(key)
            .map(|e| now - e.inserted_at >= inner.ttl_millis)?;

        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            return None;
        }
        inner.entries.get(key).map(|e| e.value.clone())
    }

    pub fn put(&self, key: String, value: V) {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else {
            while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
                let oldest = inner.order.remove(0);
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutlineKeyFields<'a> {
    title: Option<&'a str>,
    query: Option<&'a str>,
    gsc_insights: Option<&'a serde_json::Value>,
    outline_structure: &'a str,
}

/// Hex SHA-256 of the request's canonical JSON.
///
/// Fields serialize in the fixed order title, query, gscInsights,
/// outlineStructure, with absent values as `null`.
pub fn outline_cache_key(request: &OutlineRequest) -> Result<String> {
    let fields = OutlineKeyFields {
        title: request.title.as_deref(),
        query: request.query.as_deref(),
        gsc_insights: request.gsc_insights.as_ref(),
        outline_structure: &request.outline_structure,
    };
    let canonical = serde_json::to_vec(&fields)?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}
