//! Redis backend for the relation cache.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, RedisError, aio::ConnectionManager};
use tokio::time::timeout;

use crate::domain::entities::RelationKey;

use super::config::CacheConfig;
use super::keys::RelationCacheKey;
use super::store::{CacheError, RelationCache};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

/// Relation cache stored as plain string keys (`SET key 1`).
#[derive(Clone)]
pub struct RedisRelationCache {
    conn: ConnectionManager,
    key_prefix: String,
    op_timeout: Duration,
    entry_ttl: Option<Duration>,
}

impl RedisRelationCache {
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| CacheError::Unavailable("redis url is not configured".into()))?;
        let client = redis::Client::open(url)?;
        let conn = match timeout(CONNECT_TIMEOUT, ConnectionManager::new(client)).await {
            Ok(conn) => conn?,
            Err(_) => {
                return Err(CacheError::Timeout {
                    op: "connect",
                    timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
                });
            }
        };

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            op_timeout: config.op_timeout(),
            entry_ttl: config.entry_ttl(),
        })
    }

    fn encode(&self, key: &RelationKey) -> RelationCacheKey {
        RelationCacheKey::new(&self.key_prefix, key)
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, RedisError>> + Send,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: self.op_timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl RelationCache for RedisRelationCache {
    async fn set_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        let cache_key = self.encode(key);
        let mut conn = self.conn.clone();
        let ttl = self.entry_ttl;
        self.bounded("set_exists", async move {
            match ttl {
                Some(ttl) => {
                    conn.set_ex::<_, _, ()>(cache_key.as_str(), 1u8, ttl.as_secs())
                        .await
                }
                None => conn.set::<_, _, ()>(cache_key.as_str(), 1u8).await,
            }
        })
        .await
    }

    async fn remove_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        let cache_key = self.encode(key);
        let mut conn = self.conn.clone();
        self.bounded("remove_exists", async move {
            conn.del::<_, ()>(cache_key.as_str()).await
        })
        .await
    }

    async fn check_exists(&self, key: &RelationKey) -> Result<bool, CacheError> {
        let cache_key = self.encode(key);
        let mut conn = self.conn.clone();
        self.bounded("check_exists", async move {
            conn.exists::<_, bool>(cache_key.as_str()).await
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
