//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{RelationKey, UserRecord, VideoRecord};
use crate::domain::types::RelationKind;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("referenced entity does not exist (constraint `{constraint}`)")]
    ForeignKey { constraint: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Result of a relation mutation that committed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationWrite {
    /// A row was inserted or deleted and the counters moved by exactly one.
    Applied,
    /// The relation was already in the requested state; counters untouched.
    Unchanged,
}

impl RelationWrite {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationWrite::Applied => "applied",
            RelationWrite::Unchanged => "unchanged",
        }
    }
}

#[async_trait]
pub trait RelationsRepo: Send + Sync {
    async fn relation_exists(&self, key: &RelationKey) -> Result<bool, RepoError>;

    /// Denormalized counter of the target; `None` when the target does not exist.
    async fn counter_for(&self, target_id: i64, kind: RelationKind)
    -> Result<Option<i64>, RepoError>;

    /// `favorite_count` of every video authored by `owner_id`.
    async fn received_favorite_counters(&self, owner_id: i64) -> Result<Vec<i64>, RepoError>;

    async fn count_given_by(&self, actor_id: i64, kind: RelationKind) -> Result<i64, RepoError>;

    /// Target ids for the actor, newest relation first.
    async fn list_target_ids(&self, actor_id: i64, kind: RelationKind)
    -> Result<Vec<i64>, RepoError>;

    /// Actor ids pointing at the target, newest relation first.
    async fn list_actor_ids(&self, target_id: i64, kind: RelationKind)
    -> Result<Vec<i64>, RepoError>;

    async fn find_videos(&self, ids: &[i64]) -> Result<Vec<VideoRecord>, RepoError>;

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError>;
}

/// Transactional relation mutations.
///
/// Every method runs in its own store transaction: the relation row and the
/// counters it drives either all change or none do.
#[async_trait]
pub trait RelationsWriteRepo: Send + Sync {
    async fn insert_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError>;

    async fn delete_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError>;

    /// Recompute the target counter from relation rows and persist it.
    async fn reconcile_counter(&self, target_id: i64, kind: RelationKind)
    -> Result<i64, RepoError>;
}
