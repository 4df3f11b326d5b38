use async_trait::async_trait;

use crate::application::repos::{RelationsRepo, RepoError};
use crate::domain::entities::{RelationKey, UserRecord, VideoRecord};
use crate::domain::types::RelationKind;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::sql_for;
use super::types::{UserRow, VideoRow};

#[async_trait]
impl RelationsRepo for PostgresRepositories {
    async fn relation_exists(&self, key: &RelationKey) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(sql_for(key.kind).exists)
            .bind(key.actor_id)
            .bind(key.target_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn counter_for(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Option<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(sql_for(kind).counter)
            .bind(target_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn received_favorite_counters(&self, owner_id: i64) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT favorite_count
            FROM videos
            WHERE author_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_given_by(&self, actor_id: i64, kind: RelationKind) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(sql_for(kind).count_given)
            .bind(actor_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_target_ids(
        &self,
        actor_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(sql_for(kind).list_targets)
            .bind(actor_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_actor_ids(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        sqlx::query_scalar::<_, i64>(sql_for(kind).list_actors)
            .bind(target_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_videos(&self, ids: &[i64]) -> Result<Vec<VideoRecord>, RepoError> {
        let rows = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT id, author_id, title, favorite_count, created_at
            FROM videos
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, follow_count, follower_count, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }
}
