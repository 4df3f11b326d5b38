use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::repos::{RelationWrite, RelationsWriteRepo, RepoError};
use crate::cache::RelationCache;
use crate::domain::entities::RelationKey;
use crate::domain::types::RelationKind;

use super::{CacheStep, RelationError, TARGET, apply_cache_step};

/// Creates and deletes relations together with their counters.
#[derive(Clone)]
pub struct RelationWriteService {
    writer: Arc<dyn RelationsWriteRepo>,
    cache: Arc<dyn RelationCache>,
}

impl RelationWriteService {
    pub fn new(writer: Arc<dyn RelationsWriteRepo>, cache: Arc<dyn RelationCache>) -> Self {
        Self { writer, cache }
    }

    /// Idempotent create. A duplicate returns [`RelationWrite::Unchanged`]
    /// and leaves counters alone.
    #[instrument(skip(self))]
    pub async fn create_relation(&self, key: RelationKey) -> Result<RelationWrite, RelationError> {
        let outcome = self.writer.insert_relation(&key).await.map_err(|err| {
            warn!(
                target = TARGET,
                actor_id = key.actor_id,
                target_id = key.target_id,
                kind = %key.kind,
                error = %err,
                "create relation rolled back"
            );
            RelationError::from(err)
        })?;

        debug!(
            target = TARGET,
            actor_id = key.actor_id,
            target_id = key.target_id,
            kind = %key.kind,
            outcome = outcome.as_str(),
            "create relation committed"
        );

        apply_cache_step(&self.cache, key, CacheStep::Set).await;
        Ok(outcome)
    }

    /// Idempotent delete. A missing relation returns
    /// [`RelationWrite::Unchanged`]; the cache entry is purged either way.
    #[instrument(skip(self))]
    pub async fn delete_relation(&self, key: RelationKey) -> Result<RelationWrite, RelationError> {
        let outcome = self.writer.delete_relation(&key).await.map_err(|err| {
            warn!(
                target = TARGET,
                actor_id = key.actor_id,
                target_id = key.target_id,
                kind = %key.kind,
                error = %err,
                "delete relation rolled back"
            );
            RelationError::from(err)
        })?;

        debug!(
            target = TARGET,
            actor_id = key.actor_id,
            target_id = key.target_id,
            kind = %key.kind,
            outcome = outcome.as_str(),
            "delete relation committed"
        );

        apply_cache_step(&self.cache, key, CacheStep::Remove).await;
        Ok(outcome)
    }

    /// Recompute a target's counter from its relation rows.
    #[instrument(skip(self))]
    pub async fn reconcile_counter(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<i64, RelationError> {
        let count = self
            .writer
            .reconcile_counter(target_id, kind)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => RelationError::NotFound {
                    entity: kind.target_entity(),
                },
                other => RelationError::from(other),
            })?;

        info!(
            target = TARGET,
            target_id,
            kind = %kind,
            count,
            "counter reconciled"
        );
        Ok(count)
    }
}
