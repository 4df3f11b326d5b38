use time::OffsetDateTime;

use crate::domain::entities::{UserRecord, VideoRecord};

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) follow_count: i64,
    pub(super) follower_count: i64,
    pub(super) created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            follow_count: row.follow_count,
            follower_count: row.follower_count,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct VideoRow {
    pub(super) id: i64,
    pub(super) author_id: i64,
    pub(super) title: String,
    pub(super) favorite_count: i64,
    pub(super) created_at: OffsetDateTime,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            favorite_count: row.favorite_count,
            created_at: row.created_at,
        }
    }
}
