use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ServiceResult;

/// Repository for the follow graph
#[derive(Clone)]
pub struct FollowRepository {
    pool: PgPool,
}

impl FollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent create follow; returns true if a new row was inserted
    pub async fn create_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<bool> {
        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO follows (id, follower_id, followee_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Idempotent delete; returns true if a row was removed
    pub async fn delete_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followee_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    /// Every current follower of a user. A snapshot read: fan-out tolerates
    /// followers joining or leaving between calls.
    pub async fn find_followers(&self, followee_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let follower_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT follower_id
            FROM follows
            WHERE followee_id = $1
            "#,
        )
        .bind(followee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(follower_ids)
    }

    /// Followers of a user with pagination; returns (ids, total)
    pub async fn get_followers(
        &self,
        followee_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Uuid>, i64)> {
        let follower_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT follower_id
            FROM follows
            WHERE followee_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(followee_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM follows
            WHERE followee_id = $1
            "#,
        )
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((follower_ids, total))
    }

    /// Users a user is following, with pagination; returns (ids, total)
    pub async fn get_following(
        &self,
        follower_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Uuid>, i64)> {
        let followee_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT followee_id
            FROM follows
            WHERE follower_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM follows
            WHERE follower_id = $1
            "#,
        )
        .bind(follower_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((followee_ids, total))
    }

    /// Check if follower is following followee
    pub async fn is_following(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_id = $1 AND followee_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
