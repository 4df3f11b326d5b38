//! Favorite and follow relations: transactional writes and cache-aside reads.
//!
//! The store is the only source of truth. Every relation insert or delete
//! moves the affected counters inside the same store transaction; the cache
//! is reconciled strictly after commit and its failures never reach callers.

mod query;
mod write;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::application::repos::RepoError;
use crate::cache::{RelationCache, counters};
use crate::domain::entities::RelationKey;

pub use query::RelationQueryService;
pub use write::RelationWriteService;

const TARGET: &str = "socialgraph::relations";

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("referenced entity does not exist (constraint `{constraint}`)")]
    MissingEntity { constraint: String },
    #[error(transparent)]
    Store(RepoError),
}

impl From<RepoError> for RelationError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::ForeignKey { constraint } => RelationError::MissingEntity { constraint },
            other => RelationError::Store(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CacheStep {
    Set,
    Remove,
}

impl CacheStep {
    fn as_str(self) -> &'static str {
        match self {
            CacheStep::Set => "set_exists",
            CacheStep::Remove => "remove_exists",
        }
    }
}

/// Apply a cache mutation on its own task.
///
/// The spawned task outlives the caller's future, so a request cancelled
/// after its store commit still reconciles the cache. Failures are logged
/// and counted only.
async fn apply_cache_step(cache: &Arc<dyn RelationCache>, key: RelationKey, step: CacheStep) {
    let cache = Arc::clone(cache);
    let backend = cache.backend();
    let handle = tokio::spawn(async move {
        match step {
            CacheStep::Set => cache.set_exists(&key).await,
            CacheStep::Remove => cache.remove_exists(&key).await,
        }
    });

    let error = match handle.await {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err.to_string(),
        Err(join_err) => format!("cache task aborted: {join_err}"),
    };

    counters::record_error(key.kind, step.as_str());
    warn!(
        target = TARGET,
        op = step.as_str(),
        backend,
        actor_id = key.actor_id,
        target_id = key.target_id,
        kind = %key.kind,
        error = %error,
        "relation cache update failed; entry may be stale"
    );
}
