use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::application::repos::{RelationWrite, RelationsWriteRepo, RepoError};
use crate::domain::entities::RelationKey;
use crate::domain::types::RelationKind;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::sql_for;

/// Move the counters driven by `key` by `delta` inside `tx`.
///
/// Follow touches two user rows in a single statement so both counters
/// are locked together.
async fn shift_counters(
    tx: &mut Transaction<'_, Postgres>,
    key: &RelationKey,
    delta: i64,
) -> Result<(), RepoError> {
    let (result, expected) = match key.kind {
        RelationKind::Favorite => {
            let result = sqlx::query(
                r#"
                UPDATE videos
                SET favorite_count = favorite_count + $2
                WHERE id = $1
                "#,
            )
            .bind(key.target_id)
            .bind(delta)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
            (result, 1)
        }
        RelationKind::Follow => {
            let result = sqlx::query(
                r#"
                UPDATE users
                SET follower_count = follower_count
                        + CASE WHEN id = $2 THEN $3 ELSE 0 END,
                    follow_count = follow_count
                        + CASE WHEN id = $1 THEN $3 ELSE 0 END
                WHERE id IN ($1, $2)
                "#,
            )
            .bind(key.actor_id)
            .bind(key.target_id)
            .bind(delta)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
            let expected = if key.actor_id == key.target_id { 1 } else { 2 };
            (result, expected)
        }
    };

    if result.rows_affected() != expected {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl RelationsWriteRepo for PostgresRepositories {
    async fn insert_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError> {
        let mut tx = self.begin().await?;

        let inserted = sqlx::query(sql_for(key.kind).insert)
            .bind(key.actor_id)
            .bind(key.target_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if inserted == 0 {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(RelationWrite::Unchanged);
        }

        shift_counters(&mut tx, key, 1).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(RelationWrite::Applied)
    }

    async fn delete_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError> {
        let mut tx = self.begin().await?;

        let deleted = sqlx::query(sql_for(key.kind).delete)
            .bind(key.actor_id)
            .bind(key.target_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if deleted == 0 {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(RelationWrite::Unchanged);
        }

        shift_counters(&mut tx, key, -1).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(RelationWrite::Applied)
    }

    async fn reconcile_counter(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<i64, RepoError> {
        let sql = sql_for(kind);
        let mut tx = self.begin().await?;

        sqlx::query_scalar::<_, i64>(sql.lock_target)
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        let count = sqlx::query_scalar::<_, i64>(sql.count_received)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        match kind {
            RelationKind::Favorite => {
                sqlx::query("UPDATE videos SET favorite_count = $2 WHERE id = $1")
                    .bind(target_id)
                    .bind(count)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }
            RelationKind::Follow => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET follower_count = $2,
                        follow_count = (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
                    WHERE id = $1
                    "#,
                )
                .bind(target_id)
                .bind(count)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(count)
    }
}
