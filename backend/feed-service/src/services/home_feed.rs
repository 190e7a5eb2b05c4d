//! Paginated home feed reads.
//!
//! A page is a rank window over the requesting user's feed index. The
//! index gives ordered post ids; the durable store resolves them to post
//! records. The store's return order is NOT trusted: resolved records are
//! re-sorted to the index's order, and an id with no resolvable record is
//! dropped rather than erroring, since the durable store is authoritative
//! and the cache entry may be stale.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::models::{FeedPage, FeedStatus};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::RecordStore;
use crate::services::feed_index::FeedIndex;

#[derive(Clone)]
pub struct HomeFeedService {
    index: FeedIndex,
    records: Arc<dyn RecordStore>,
    default_limit: i64,
    max_limit: i64,
}

impl HomeFeedService {
    pub fn new(
        index: FeedIndex,
        records: Arc<dyn RecordStore>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        Self {
            index,
            records,
            default_limit,
            max_limit,
        }
    }

    /// Read one page of a user's home feed.
    ///
    /// `cursor` is an opaque rank offset from a previous page; absent means
    /// rank 0. `limit` falls back to the configured default and is capped
    /// at the configured maximum.
    pub async fn get_home_feed(
        &self,
        user_id: Uuid,
        cursor: Option<&str>,
        limit: Option<i64>,
    ) -> ServiceResult<FeedPage> {
        let limit = self.sanitize_limit(limit);
        let start_rank = parse_cursor(cursor)?;
        let end_rank = start_rank + limit - 1;

        let post_ids = self
            .index
            .range_descending(user_id, start_rank, end_rank)
            .await?;

        if post_ids.is_empty() {
            debug!("Empty feed window for user {} at rank {}", user_id, start_rank);
            return Ok(FeedPage::empty());
        }

        let posts = self.records.fetch_posts_by_ids(&post_ids).await?;
        let mut by_id: HashMap<Uuid, _> = posts.into_iter().map(|p| (p.id, p)).collect();

        // Preserve index order; drop ids the durable store no longer knows
        let edges: Vec<_> = post_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        // A full window means there may be more; a short one ends the feed
        let next_cursor = if post_ids.len() as i64 == limit {
            Some((end_rank + 1).to_string())
        } else {
            None
        };

        Ok(FeedPage {
            edges,
            next_cursor,
            status: FeedStatus::Fetched,
        })
    }

    fn sanitize_limit(&self, limit: Option<i64>) -> i64 {
        match limit {
            Some(requested) if requested >= 1 => requested.min(self.max_limit),
            _ => self.default_limit,
        }
    }
}

/// Decode the opaque pagination cursor (a stringified rank offset)
fn parse_cursor(cursor: Option<&str>) -> ServiceResult<i64> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|rank| *rank >= 0)
            .ok_or_else(|| ServiceError::InvalidInput(format!("invalid feed cursor: {}", raw))),
    }
}
