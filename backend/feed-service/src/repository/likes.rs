use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::Like;
use crate::error::ServiceResult;

/// Repository for Like operations
#[derive(Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent create; returns true if a new row was inserted
    pub async fn create_like(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO likes (id, user_id, post_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Idempotent delete; returns true if a row was removed
    pub async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    /// Check if user has liked a post
    pub async fn exists(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE user_id = $1 AND post_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Authoritative like count for a post (cache-miss fallback)
    pub async fn count_for_post(&self, post_id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM likes
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Likes on a post, most recent first (paginated)
    pub async fn get_post_likes(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Like>> {
        let likes = sqlx::query_as::<_, Like>(
            r#"
            SELECT id, user_id, post_id, created_at
            FROM likes
            WHERE post_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }
}
