use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - creation time is immutable and anchors the rank score
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Creation time in Unix milliseconds, the base of the rank score
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// Comment entity - represents a comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Like entity - represents a user liking a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Cached engagement counters for a post. Rebuildable from the durable
/// store; never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub like_count: i64,
    pub comment_count: i64,
}

/// Author id + creation time of a post, the two facts every fan-out needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostMeta {
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PostMeta {
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// One page of a user's home feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    /// Posts in rank order (highest score first)
    pub edges: Vec<Post>,
    /// Rank offset of the next page; None once the feed is exhausted
    pub next_cursor: Option<String>,
    pub status: FeedStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedStatus {
    Fetched,
    Empty,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            next_cursor: None,
            status: FeedStatus::Empty,
        }
    }
}
