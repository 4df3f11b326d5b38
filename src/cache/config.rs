//! Cache configuration.

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use serde::Deserialize;

const DEFAULT_MEMORY_CAPACITY: usize = 100_000;
const DEFAULT_OP_TIMEOUT_MS: u64 = 50;
const DEFAULT_KEY_PREFIX: &str = "sg";
const DEFAULT_ENTRY_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    Redis,
    Disabled,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "disabled" | "none" | "off" => Ok(CacheBackend::Disabled),
            other => Err(format!(
                "unknown cache backend `{other}` (expected memory, redis or disabled)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection URL for the redis backend.
    pub redis_url: Option<String>,
    /// Maximum entries held by the memory backend.
    pub memory_capacity: usize,
    /// Upper bound for a single cache round-trip.
    pub op_timeout_ms: u64,
    /// Expiry applied to every entry by both backends; `None` or `Some(0)`
    /// keeps entries until deleted.
    pub entry_ttl_seconds: Option<u64>,
    /// Prefix shared by every encoded key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
            entry_ttl_seconds: Some(DEFAULT_ENTRY_TTL_SECS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            memory_capacity: settings.memory_capacity.get(),
            op_timeout_ms: settings.op_timeout.as_millis() as u64,
            entry_ttl_seconds: settings.entry_ttl.map(|ttl| ttl.as_secs()),
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl CacheConfig {
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms.max(1))
    }

    pub fn entry_ttl(&self) -> Option<Duration> {
        self.entry_ttl_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
