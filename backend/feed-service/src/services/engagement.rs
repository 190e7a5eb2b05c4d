//! API-facing engagement operations.
//!
//! Each mutation runs its guards before touching anything, mirrors the
//! durable store, moves the cached counters, and fans the recomputed score
//! out to follower feeds synchronously within the request. Idempotent
//! no-ops (double like, unlike without a like, re-follow) are ordinary
//! outcome values, not errors.

use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::{Comment, EngagementCounts, Like, Post};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    CommentRepository, FollowRepository, LikeRepository, PostRepository, RecordStore,
};
use crate::services::counters::CounterService;
use crate::services::fanout::FanoutService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LikeOutcome {
    Liked { like_count: i64 },
    AlreadyLiked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnlikeOutcome {
    Unliked { like_count: i64 },
    NotLiked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
}

#[derive(Clone)]
pub struct EngagementService {
    records: Arc<dyn RecordStore>,
    posts: PostRepository,
    comments: CommentRepository,
    likes: LikeRepository,
    follows: FollowRepository,
    counters: CounterService,
    fanout: FanoutService,
}

impl EngagementService {
    pub fn new(
        pool: PgPool,
        records: Arc<dyn RecordStore>,
        counters: CounterService,
        fanout: FanoutService,
    ) -> Self {
        Self {
            records,
            posts: PostRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            follows: FollowRepository::new(pool),
            counters,
            fanout,
        }
    }

    // ========== Posts ==========

    /// Create a post and seed it into the author's and all followers'
    /// feeds. Counters start at zero, so the initial score is the creation
    /// time itself.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: String,
        media_url: Option<String>,
    ) -> ServiceResult<Post> {
        if content.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "post content must not be empty".into(),
            ));
        }

        let post = self.posts.create_post(author_id, content, media_url).await?;

        self.fanout
            .dispatch(author_id, post.id, post.created_at_millis(), 0, 0)
            .await?;

        debug!("Created post {} by {}", post.id, author_id);
        Ok(post)
    }

    /// A user's own posts, newest first
    pub async fn get_user_posts(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Post>> {
        self.posts.get_user_posts(author_id, limit, offset).await
    }

    // ========== Likes ==========

    /// Like a post. A like from a user who already likes it is a no-op
    /// reported as `AlreadyLiked`; nothing is mutated and no fan-out runs.
    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<LikeOutcome> {
        let meta = self
            .records
            .find_post_meta(post_id)
            .await?
            .ok_or(ServiceError::PostNotFound(post_id))?;

        if self.counters.is_liked(user_id, post_id).await? {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        let like_count = self.counters.register_like(user_id, post_id).await?;
        self.likes.create_like(user_id, post_id).await?;

        let comment_count = self.counters.get_comment_count(post_id).await?;
        self.fanout
            .dispatch(
                meta.author_id,
                post_id,
                meta.created_at_millis(),
                like_count,
                comment_count,
            )
            .await?;

        Ok(LikeOutcome::Liked { like_count })
    }

    /// Unlike a post; symmetric to [`like_post`](Self::like_post)
    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<UnlikeOutcome> {
        let meta = self
            .records
            .find_post_meta(post_id)
            .await?
            .ok_or(ServiceError::PostNotFound(post_id))?;

        if !self.counters.is_liked(user_id, post_id).await? {
            return Ok(UnlikeOutcome::NotLiked);
        }

        let like_count = self.counters.register_unlike(user_id, post_id).await?;
        self.likes.delete_like(user_id, post_id).await?;

        let comment_count = self.counters.get_comment_count(post_id).await?;
        self.fanout
            .dispatch(
                meta.author_id,
                post_id,
                meta.created_at_millis(),
                like_count,
                comment_count,
            )
            .await?;

        Ok(UnlikeOutcome::Unliked { like_count })
    }

    /// Whether a user currently likes a post
    pub async fn has_liked(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.counters.is_liked(user_id, post_id).await
    }

    /// Likes on a post, most recent first
    pub async fn get_post_likes(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Like>> {
        self.likes.get_post_likes(post_id, limit, offset).await
    }

    /// Cached like and comment counts for a post
    pub async fn get_post_counts(&self, post_id: Uuid) -> ServiceResult<EngagementCounts> {
        self.counters.counts(post_id).await
    }

    // ========== Comments ==========

    /// Comment on a post; returns the comment and the new comment count
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        content: String,
    ) -> ServiceResult<(Comment, i64)> {
        if content.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "comment content must not be empty".into(),
            ));
        }

        let meta = self
            .records
            .find_post_meta(post_id)
            .await?
            .ok_or(ServiceError::PostNotFound(post_id))?;

        let comment = self
            .comments
            .create_comment(post_id, user_id, content)
            .await?;

        let comment_count = self.counters.increment_comment_count(post_id).await?;
        let like_count = self.counters.get_like_count(post_id).await?;

        self.fanout
            .dispatch(
                meta.author_id,
                post_id,
                meta.created_at_millis(),
                like_count,
                comment_count,
            )
            .await?;

        Ok((comment, comment_count))
    }

    /// Delete an own comment; returns the new comment count. Deleting a
    /// comment owned by someone else is rejected before any counter or
    /// fan-out side effect.
    pub async fn delete_comment(&self, user_id: Uuid, comment_id: Uuid) -> ServiceResult<i64> {
        let comment = self
            .records
            .find_comment(comment_id)
            .await?
            .ok_or(ServiceError::CommentNotFound(comment_id))?;

        if comment.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "only the comment owner can delete it".into(),
            ));
        }

        let meta = self
            .records
            .find_post_meta(comment.post_id)
            .await?
            .ok_or(ServiceError::PostNotFound(comment.post_id))?;

        self.comments.delete_comment(comment_id, user_id).await?;

        let comment_count = self.counters.decrement_comment_count(comment.post_id).await?;
        let like_count = self.counters.get_like_count(comment.post_id).await?;

        self.fanout
            .dispatch(
                meta.author_id,
                comment.post_id,
                meta.created_at_millis(),
                like_count,
                comment_count,
            )
            .await?;

        Ok(comment_count)
    }

    /// Paginated comments for a post, newest first
    pub async fn get_comments(
        &self,
        post_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Comment>> {
        self.comments.get_comments(post_id, limit, offset).await
    }

    // ========== Follow graph ==========

    /// Follow a user; re-following is a no-op outcome
    pub async fn follow_user(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<FollowOutcome> {
        if follower_id == followee_id {
            return Err(ServiceError::InvalidInput(
                "users cannot follow themselves".into(),
            ));
        }

        let inserted = self.follows.create_follow(follower_id, followee_id).await?;
        Ok(if inserted {
            FollowOutcome::Followed
        } else {
            FollowOutcome::AlreadyFollowing
        })
    }

    /// Unfollow a user; unfollowing a non-followed user is a no-op outcome
    pub async fn unfollow_user(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<UnfollowOutcome> {
        let removed = self.follows.delete_follow(follower_id, followee_id).await?;
        Ok(if removed {
            UnfollowOutcome::Unfollowed
        } else {
            UnfollowOutcome::NotFollowing
        })
    }

    /// Followers of a user with pagination; returns (ids, total)
    pub async fn get_followers(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Uuid>, i64)> {
        self.follows.get_followers(user_id, limit, offset).await
    }

    /// Users a user follows, with pagination; returns (ids, total)
    pub async fn get_following(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Uuid>, i64)> {
        self.follows.get_following(user_id, limit, offset).await
    }

    /// Whether follower currently follows followee
    pub async fn is_following(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> ServiceResult<bool> {
        self.follows.is_following(follower_id, followee_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyValueStore, MemoryStore};
    use crate::repository::MockRecordStore;
    use crate::services::feed_index::FeedIndex;
    use chrono::{TimeZone, Utc};
    use sqlx::postgres::PgPoolOptions;

    use crate::domain::models::PostMeta;

    fn meta() -> PostMeta {
        PostMeta {
            author_id: Uuid::new_v4(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    /// Pool that never connects; guard-path tests fail before any query
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/feed_test")
            .expect("lazy pool construction cannot fail")
    }

    fn service_with(records: MockRecordStore) -> (EngagementService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let records: Arc<dyn RecordStore> = Arc::new(records);
        let counters = CounterService::new(store.clone(), records.clone());
        let index = FeedIndex::new(store.clone());
        let fanout = FanoutService::new(index, records.clone(), 128);
        (
            EngagementService::new(lazy_pool(), records, counters, fanout),
            store,
        )
    }

    #[tokio::test]
    async fn test_like_of_missing_post_is_not_found() {
        let mut records = MockRecordStore::new();
        records.expect_find_post_meta().returning(|_| Ok(None));
        let (service, _) = service_with(records);

        let err = service
            .like_post(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn test_double_like_is_a_noop_outcome() {
        let post_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut records = MockRecordStore::new();
        records
            .expect_find_post_meta()
            .returning(move |_| Ok(Some(meta())));
        records.expect_has_liked().returning(|_, _| Ok(false));
        let (service, store) = service_with(records);

        // Seed the membership set the way a prior like would have
        store
            .add_member_and_incr(
                &format!("like:user:{}", post_id),
                &user_id.to_string(),
                &format!("like:count:{}", post_id),
            )
            .await
            .unwrap();

        let outcome = service.like_post(user_id, post_id).await.unwrap();
        assert_eq!(outcome, LikeOutcome::AlreadyLiked);

        // The counter did not move
        let count = store
            .get_int(&format!("like:count:{}", post_id))
            .await
            .unwrap();
        assert_eq!(count, Some(1));
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_a_noop_outcome() {
        let mut records = MockRecordStore::new();
        records
            .expect_find_post_meta()
            .returning(move |_| Ok(Some(meta())));
        records.expect_has_liked().returning(|_, _| Ok(false));
        let (service, store) = service_with(records);

        let post_id = Uuid::new_v4();
        let outcome = service
            .unlike_post(Uuid::new_v4(), post_id)
            .await
            .unwrap();
        assert_eq!(outcome, UnlikeOutcome::NotLiked);

        let count = store
            .get_int(&format!("like:count:{}", post_id))
            .await
            .unwrap();
        assert_eq!(count, None);
    }

    #[tokio::test]
    async fn test_delete_of_missing_comment_is_not_found() {
        let mut records = MockRecordStore::new();
        records.expect_find_comment().returning(|_| Ok(None));
        let (service, _) = service_with(records);

        let err = service
            .delete_comment(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CommentNotFound(_)));
    }

    #[tokio::test]
    async fn test_deleting_anothers_comment_is_forbidden_without_side_effects() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let post_id = Uuid::new_v4();

        let mut records = MockRecordStore::new();
        records.expect_find_comment().returning(move |comment_id| {
            Ok(Some(Comment {
                id: comment_id,
                post_id,
                user_id: owner,
                content: "mine".to_string(),
                created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            }))
        });
        let (service, store) = service_with(records);

        let err = service
            .delete_comment(intruder, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // No counter movement happened
        let count = store
            .get_int(&format!("comment:count:{}", post_id))
            .await
            .unwrap();
        assert_eq!(count, None);
    }

    #[tokio::test]
    async fn test_empty_post_content_is_rejected() {
        let (service, _) = service_with(MockRecordStore::new());

        let err = service
            .create_post(Uuid::new_v4(), "   ".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_self_follow_is_rejected() {
        let (service, _) = service_with(MockRecordStore::new());
        let user = Uuid::new_v4();

        let err = service.follow_user(user, user).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
