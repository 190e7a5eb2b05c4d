use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::Comment;
use crate::error::ServiceResult;

/// Repository for Comment operations
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new comment
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> ServiceResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, user_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, user_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Get a single comment by ID
    pub async fn find_comment(&self, comment_id: Uuid) -> ServiceResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, content, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Delete a comment, scoped to its owner; returns true if a row was
    /// removed
    pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    /// Get paginated comments for a post, newest first
    pub async fn get_comments(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, content, created_at
            FROM comments
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

        Ok(comments)
    }

    /// Authoritative comment count for a post (cache-miss fallback)
    pub async fn count_for_post(&self, post_id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM comments
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
