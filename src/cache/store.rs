//! Cache port and in-process backends.

use std::{
    num::NonZeroUsize,
    sync::RwLock,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;

use crate::domain::entities::RelationKey;

use super::config::CacheConfig;
use super::counters::record_evict;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation `{op}` timed out after {timeout_ms} ms")]
    Timeout { op: &'static str, timeout_ms: u64 },
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Existence index keyed by `(actor_id, target_id, kind)`.
///
/// Implementations must make each single-key operation atomic on their own;
/// nothing here participates in store transactions.
#[async_trait]
pub trait RelationCache: Send + Sync {
    /// Record that the relation exists.
    async fn set_exists(&self, key: &RelationKey) -> Result<(), CacheError>;

    /// Forget the relation. Removing an absent key succeeds.
    async fn remove_exists(&self, key: &RelationKey) -> Result<(), CacheError>;

    /// `true` only when an entry is present; `false` means unknown.
    async fn check_exists(&self, key: &RelationKey) -> Result<bool, CacheError>;

    fn backend(&self) -> &'static str;
}

/// In-process LRU backend.
///
/// Each entry carries its own deadline when a TTL is configured; an expired
/// entry reads as a miss and is dropped on that read.
pub struct MemoryRelationCache {
    entries: RwLock<LruCache<RelationKey, Option<Instant>>>,
    ttl: Option<Duration>,
}

impl MemoryRelationCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttl(config.memory_capacity_non_zero(), config.entry_ttl())
    }

    pub fn with_ttl(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RelationCache for MemoryRelationCache {
    async fn set_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        let deadline = self.ttl.map(|ttl| Instant::now() + ttl);
        let evicted = rw_write(&self.entries, SOURCE, "set_exists").push(*key, deadline);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != *key
        {
            record_evict();
        }
        Ok(())
    }

    async fn remove_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "remove_exists").pop(key);
        Ok(())
    }

    async fn check_exists(&self, key: &RelationKey) -> Result<bool, CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "check_exists");
        match entries.get(key).copied() {
            None => Ok(false),
            Some(Some(deadline)) if deadline <= Instant::now() => {
                entries.pop(key);
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Backend used when caching is turned off or unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRelationCache;

#[async_trait]
impl RelationCache for DisabledRelationCache {
    async fn set_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Ok(())
    }

    async fn remove_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Ok(())
    }

    async fn check_exists(&self, _key: &RelationKey) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
