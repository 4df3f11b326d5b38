//! Cache key encoding.
//!
//! `{prefix}:{namespace}:{actor_id}:{target_id}`. The namespace comes from the
//! relation kind so favorites and follows never share a key, and the actor
//! always precedes the target so `(a, b)` and `(b, a)` stay distinct.

use crate::domain::entities::RelationKey;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationCacheKey(String);

impl RelationCacheKey {
    pub fn new(prefix: &str, key: &RelationKey) -> Self {
        Self(format!(
            "{prefix}:{}:{}:{}",
            key.kind.cache_namespace(),
            key.actor_id,
            key.target_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
