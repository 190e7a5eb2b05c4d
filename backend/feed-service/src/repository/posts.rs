use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{Post, PostMeta};
use crate::error::ServiceResult;

/// Repository for Post operations
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: String,
        media_url: Option<String>,
    ) -> ServiceResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, media_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, content, media_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .bind(media_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// Author id and creation time for a post, if it exists
    pub async fn find_meta(&self, post_id: Uuid) -> ServiceResult<Option<PostMeta>> {
        let row: Option<(Uuid, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            r#"
            SELECT author_id, created_at FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(author_id, created_at)| PostMeta {
            author_id,
            created_at,
        }))
    }

    /// Bulk fetch by id; the returned order is whatever PostgreSQL yields,
    /// callers re-sort against their own ordering
    pub async fn fetch_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, media_url, created_at
            FROM posts
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Get a user's own posts, newest first (paginated)
    pub async fn get_user_posts(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, media_url, created_at
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
