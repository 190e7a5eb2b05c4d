//! Fan-out of rank score changes to follower feeds.
//!
//! Every qualifying engagement event (post creation, like, unlike, comment,
//! comment delete) recomputes the post's score and writes it into the
//! author's feed and every current follower's feed. The author's own entry
//! is written first; follower writes go out in pipelined batches. Each
//! write is an independent idempotent upsert, so a fan-out that fails
//! partway leaves some feeds stale rather than corrupt, and the next event
//! on the post repairs them. No rollback, no cross-key transaction.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::repository::RecordStore;
use crate::services::feed_index::FeedIndex;
use crate::services::ranking::compute_score;

#[derive(Clone)]
pub struct FanoutService {
    index: FeedIndex,
    records: Arc<dyn RecordStore>,
    batch_size: usize,
}

impl FanoutService {
    pub fn new(index: FeedIndex, records: Arc<dyn RecordStore>, batch_size: usize) -> Self {
        Self {
            index,
            records,
            batch_size: batch_size.max(1),
        }
    }

    /// Recompute a post's score and propagate it to the author's feed and
    /// every current follower's feed. Returns the number of feeds written.
    pub async fn dispatch(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        created_at_millis: i64,
        like_count: i64,
        comment_count: i64,
    ) -> ServiceResult<usize> {
        let score = compute_score(created_at_millis, like_count, comment_count);

        // The author's own entry lands before any follower sees the score
        self.index.upsert(author_id, post_id, score).await?;

        let followers = self.records.find_followers(author_id).await?;
        for chunk in followers.chunks(self.batch_size) {
            self.index.upsert_many(chunk, post_id, score).await?;
        }

        debug!(
            "Fanned out post {} (score {}) to {} follower feeds",
            post_id,
            score,
            followers.len()
        );

        Ok(followers.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::repository::MockRecordStore;

    fn fanout_with_followers(followers: Vec<Uuid>) -> (FanoutService, FeedIndex) {
        let store = Arc::new(MemoryStore::new());
        let index = FeedIndex::new(store);

        let mut records = MockRecordStore::new();
        records
            .expect_find_followers()
            .returning(move |_| Ok(followers.clone()));

        let fanout = FanoutService::new(index.clone(), Arc::new(records), 2);
        (fanout, index)
    }

    #[tokio::test]
    async fn test_dispatch_writes_author_and_all_followers() {
        let followers: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let (fanout, index) = fanout_with_followers(followers.clone());

        let author = Uuid::new_v4();
        let post = Uuid::new_v4();

        // 5 followers with batch size 2 exercises a ragged final chunk
        let written = fanout.dispatch(author, post, 1_000, 0, 0).await.unwrap();
        assert_eq!(written, 6);

        for user in followers.iter().chain(std::iter::once(&author)) {
            let ids = index.range_descending(*user, 0, 0).await.unwrap();
            assert_eq!(ids, vec![post], "feed of {} missing the post", user);
        }
    }

    #[tokio::test]
    async fn test_dispatch_updates_existing_entries_in_place() {
        let follower = Uuid::new_v4();
        let (fanout, index) = fanout_with_followers(vec![follower]);

        let author = Uuid::new_v4();
        let (older, newer) = (Uuid::new_v4(), Uuid::new_v4());

        fanout.dispatch(author, older, 1_000, 0, 0).await.unwrap();
        fanout.dispatch(author, newer, 2_000, 0, 0).await.unwrap();
        assert_eq!(
            index.range_descending(follower, 0, 1).await.unwrap(),
            vec![newer, older]
        );

        // A like on the older post lifts it above the newer one
        fanout.dispatch(author, older, 1_000, 1, 0).await.unwrap();
        assert_eq!(
            index.range_descending(follower, 0, 1).await.unwrap(),
            vec![older, newer]
        );
    }

    #[tokio::test]
    async fn test_dispatch_with_no_followers_still_writes_author() {
        let (fanout, index) = fanout_with_followers(Vec::new());

        let author = Uuid::new_v4();
        let post = Uuid::new_v4();

        let written = fanout.dispatch(author, post, 1_000, 0, 0).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            index.range_descending(author, 0, 0).await.unwrap(),
            vec![post]
        );
    }
}
