//! Authoritative read surface consumed by the feed engine.
//!
//! The counter cache, the fan-out dispatcher, and the feed reader only
//! ever READ the durable store, and only through this trait. Keeping the
//! surface narrow keeps the cache-rebuild path in one place and lets tests
//! substitute a stub for the whole durable side.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{Comment, Post, PostMeta};
use crate::error::ServiceResult;
use crate::repository::{CommentRepository, FollowRepository, LikeRepository, PostRepository};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Author id and creation time of a post; None if the post is gone
    async fn find_post_meta(&self, post_id: Uuid) -> ServiceResult<Option<PostMeta>>;

    /// Snapshot of the current follower set of an author
    async fn find_followers(&self, author_id: Uuid) -> ServiceResult<Vec<Uuid>>;

    /// Bulk fetch posts by id; order is NOT guaranteed
    async fn fetch_posts_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<Post>>;

    /// Authoritative like count (cache-miss fallback)
    async fn count_likes(&self, post_id: Uuid) -> ServiceResult<i64>;

    /// Authoritative comment count (cache-miss fallback)
    async fn count_comments(&self, post_id: Uuid) -> ServiceResult<i64>;

    /// Durable check whether a user likes a post (membership-set fallback)
    async fn has_liked(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool>;

    /// Look up a comment for the delete-comment ownership guard
    async fn find_comment(&self, comment_id: Uuid) -> ServiceResult<Option<Comment>>;
}

/// PostgreSQL-backed record store, delegating to the repositories
#[derive(Clone)]
pub struct PgRecordStore {
    posts: PostRepository,
    comments: CommentRepository,
    likes: LikeRepository,
    follows: FollowRepository,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            follows: FollowRepository::new(pool),
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_post_meta(&self, post_id: Uuid) -> ServiceResult<Option<PostMeta>> {
        self.posts.find_meta(post_id).await
    }

    async fn find_followers(&self, author_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        self.follows.find_followers(author_id).await
    }

    async fn fetch_posts_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<Post>> {
        self.posts.fetch_by_ids(ids).await
    }

    async fn count_likes(&self, post_id: Uuid) -> ServiceResult<i64> {
        self.likes.count_for_post(post_id).await
    }

    async fn count_comments(&self, post_id: Uuid) -> ServiceResult<i64> {
        self.comments.count_for_post(post_id).await
    }

    async fn has_liked(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.likes.exists(user_id, post_id).await
    }

    async fn find_comment(&self, comment_id: Uuid) -> ServiceResult<Option<Comment>> {
        self.comments.find_comment(comment_id).await
    }
}
