use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::repos::{RelationsRepo, RepoError};
use crate::cache::{RelationCache, counters};
use crate::domain::entities::{RelationKey, UserRecord, VideoRecord};
use crate::domain::types::RelationKind;

use super::{CacheStep, RelationError, TARGET, apply_cache_step};

/// Read side: existence checks answered through the cache, counters and
/// listings straight from the store.
#[derive(Clone)]
pub struct RelationQueryService {
    reader: Arc<dyn RelationsRepo>,
    cache: Arc<dyn RelationCache>,
}

impl RelationQueryService {
    pub fn new(reader: Arc<dyn RelationsRepo>, cache: Arc<dyn RelationCache>) -> Self {
        Self { reader, cache }
    }

    /// Whether the relation exists.
    ///
    /// A cache hit is trusted. A miss or a cache error falls back to the
    /// store, and only a positive store answer is written back.
    #[instrument(skip(self))]
    pub async fn exists(&self, key: RelationKey) -> Result<bool, RelationError> {
        match self.cache.check_exists(&key).await {
            Ok(true) => {
                counters::record_hit(key.kind);
                return Ok(true);
            }
            Ok(false) => counters::record_miss(key.kind),
            Err(err) => {
                counters::record_error(key.kind, "check_exists");
                warn!(
                    target = TARGET,
                    op = "check_exists",
                    backend = self.cache.backend(),
                    actor_id = key.actor_id,
                    target_id = key.target_id,
                    kind = %key.kind,
                    error = %err,
                    "relation cache read failed; falling back to store"
                );
            }
        }

        let exists = self.reader.relation_exists(&key).await?;
        debug!(
            target = TARGET,
            actor_id = key.actor_id,
            target_id = key.target_id,
            kind = %key.kind,
            exists,
            "relation existence read from store"
        );

        if exists {
            apply_cache_step(&self.cache, key, CacheStep::Set).await;
        }
        Ok(exists)
    }

    /// Denormalized counter of the target: `favorite_count` of a video or
    /// `follower_count` of a user.
    pub async fn count_for(&self, target_id: i64, kind: RelationKind) -> Result<i64, RelationError> {
        self.reader
            .counter_for(target_id, kind)
            .await?
            .ok_or(RelationError::NotFound {
                entity: kind.target_entity(),
            })
    }

    /// Sum of `favorite_count` across every video the user authored.
    ///
    /// A user without videos (or an unknown user) receives zero.
    pub async fn aggregate_received_count(&self, owner_id: i64) -> Result<i64, RelationError> {
        let totals = self.reader.received_favorite_counters(owner_id).await?;
        totals
            .into_iter()
            .try_fold(0i64, |acc, count| acc.checked_add(count))
            .ok_or_else(|| {
                RelationError::Store(RepoError::Integrity {
                    message: format!("received favorite total overflows for user {owner_id}"),
                })
            })
    }

    /// Number of relations the actor has given: videos favorited or users followed.
    pub async fn count_given_by(
        &self,
        actor_id: i64,
        kind: RelationKind,
    ) -> Result<i64, RelationError> {
        Ok(self.reader.count_given_by(actor_id, kind).await?)
    }

    /// Target ids of the actor's active relations, newest first.
    pub async fn list_relations_for(
        &self,
        actor_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RelationError> {
        Ok(self.reader.list_target_ids(actor_id, kind).await?)
    }

    /// Actor ids pointing at the target, newest first.
    pub async fn list_actors_for(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RelationError> {
        Ok(self.reader.list_actor_ids(target_id, kind).await?)
    }

    /// Videos the user favorited, resolved in one batch and kept in
    /// relation order.
    pub async fn list_favorite_videos(
        &self,
        user_id: i64,
    ) -> Result<Vec<VideoRecord>, RelationError> {
        let ids = self
            .reader
            .list_target_ids(user_id, RelationKind::Favorite)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let videos = self.reader.find_videos(&ids).await?;
        Ok(order_by_ids(&ids, videos, |video| video.id))
    }

    /// Users the user follows, newest follow first.
    pub async fn list_followed_users(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserRecord>, RelationError> {
        let ids = self
            .reader
            .list_target_ids(user_id, RelationKind::Follow)
            .await?;
        self.resolve_users(&ids).await
    }

    /// Users pointing at the target (who favorited a video, who follows a
    /// user), newest first.
    pub async fn list_actor_users(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<UserRecord>, RelationError> {
        let ids = self.reader.list_actor_ids(target_id, kind).await?;
        self.resolve_users(&ids).await
    }

    async fn resolve_users(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RelationError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = self.reader.find_users(ids).await?;
        Ok(order_by_ids(ids, users, |user| user.id))
    }
}

/// Reorder `records` to follow `ids`. Ids without a record are skipped.
fn order_by_ids<T>(ids: &[i64], records: Vec<T>, id_of: impl Fn(&T) -> i64) -> Vec<T> {
    let mut by_id: HashMap<i64, T> = records
        .into_iter()
        .map(|record| (id_of(&record), record))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
