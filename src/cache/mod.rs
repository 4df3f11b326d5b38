//! Relationship existence cache.
//!
//! A positive-only index over relation rows: a present entry means the
//! relation exists, an absent entry means "unknown, ask the store". Entries
//! are written after a committed create or a confirmed store read and removed
//! after a committed delete. Backends:
//!
//! - **memory**: in-process LRU, for single-node deployments and tests
//! - **redis**: shared across process instances
//! - **disabled**: always misses, always succeeds
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379/0"
//! op_timeout_ms = 50
//! ```

mod config;
mod keys;
mod lock;
pub mod counters;
mod redis_cache;
mod store;

use std::sync::Arc;

use tracing::{info, warn};

pub use self::config::{CacheBackend, CacheConfig};
pub use keys::RelationCacheKey;
pub use redis_cache::RedisRelationCache;
pub use store::{CacheError, DisabledRelationCache, MemoryRelationCache, RelationCache};

/// Build the configured cache backend.
///
/// A Redis backend that cannot be reached at startup degrades to
/// [`DisabledRelationCache`]; reads then always fall through to the store.
pub async fn build_relation_cache(config: &CacheConfig) -> Arc<dyn RelationCache> {
    match config.backend {
        CacheBackend::Disabled => {
            info!(target = "socialgraph::cache", "relation cache disabled");
            Arc::new(DisabledRelationCache)
        }
        CacheBackend::Memory => {
            info!(
                target = "socialgraph::cache",
                capacity = config.memory_capacity,
                "using in-process relation cache"
            );
            Arc::new(MemoryRelationCache::new(config))
        }
        CacheBackend::Redis => match RedisRelationCache::connect(config).await {
            Ok(cache) => {
                info!(target = "socialgraph::cache", "connected to redis relation cache");
                Arc::new(cache)
            }
            Err(err) => {
                warn!(
                    target = "socialgraph::cache",
                    error = %err,
                    "redis unavailable at startup, relation cache disabled"
                );
                Arc::new(DisabledRelationCache)
            }
        },
    }
}
