use serde::Serialize;
use time::OffsetDateTime;

use super::types::RelationKind;

/// Uniqueness key of a relation: at most one active row per
/// `(actor_id, target_id, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RelationKey {
    pub actor_id: i64,
    pub target_id: i64,
    pub kind: RelationKind,
}

impl RelationKey {
    pub fn new(actor_id: i64, target_id: i64, kind: RelationKind) -> Self {
        Self {
            actor_id,
            target_id,
            kind,
        }
    }

    pub fn favorite(user_id: i64, video_id: i64) -> Self {
        Self::new(user_id, video_id, RelationKind::Favorite)
    }

    pub fn follow(follower_id: i64, followee_id: i64) -> Self {
        Self::new(follower_id, followee_id, RelationKind::Follow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub follow_count: i64,
    pub follower_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub favorite_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
