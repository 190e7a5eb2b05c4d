//! Per-user ranked feed index.
//!
//! One ranked set per user maps post id -> rank score. Writes are
//! idempotent upserts, so concurrent fan-outs for the same post converge
//! without client-side locking.
//!
//! Keys: feed:user:{user_id}

use std::sync::Arc;

use uuid::Uuid;

use crate::cache::KeyValueStore;
use crate::error::ServiceResult;

fn feed_key(user_id: Uuid) -> String {
    format!("feed:user:{}", user_id)
}

#[derive(Clone)]
pub struct FeedIndex {
    store: Arc<dyn KeyValueStore>,
}

impl FeedIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Insert or replace the entry for a post in one user's feed.
    /// A post appears at most once per feed; re-upserting the same score
    /// is a no-op in effect.
    pub async fn upsert(&self, user_id: Uuid, post_id: Uuid, score: i64) -> ServiceResult<()> {
        self.store
            .ranked_put(&feed_key(user_id), &post_id.to_string(), score)
            .await
    }

    /// Write the same entry into many users' feeds with one pipelined
    /// request per call
    pub async fn upsert_many(
        &self,
        user_ids: &[Uuid],
        post_id: Uuid,
        score: i64,
    ) -> ServiceResult<()> {
        let keys: Vec<String> = user_ids.iter().map(|id| feed_key(*id)).collect();
        self.store
            .ranked_put_many(&keys, &post_id.to_string(), score)
            .await
    }

    /// Post ids in one user's feed ordered by descending score, for the
    /// closed rank window [start_rank, end_rank] (rank 0 = highest score).
    /// Ids that do not parse as UUIDs are skipped.
    pub async fn range_descending(
        &self,
        user_id: Uuid,
        start_rank: i64,
        end_rank: i64,
    ) -> ServiceResult<Vec<Uuid>> {
        let members = self
            .store
            .ranked_range_desc(&feed_key(user_id), start_rank as isize, end_rank as isize)
            .await?;

        Ok(members
            .iter()
            .filter_map(|member| Uuid::parse_str(member).ok())
            .collect())
    }

    /// Remove a post from one user's feed
    pub async fn remove(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        self.store
            .ranked_remove(&feed_key(user_id), &post_id.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn index() -> FeedIndex {
        FeedIndex::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_range_orders_by_descending_score() {
        let index = index();
        let user = Uuid::new_v4();
        let (low, mid, high) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        index.upsert(user, low, 100).await.unwrap();
        index.upsert(user, high, 300).await.unwrap();
        index.upsert(user, mid, 200).await.unwrap();

        let ids = index.range_descending(user, 0, 2).await.unwrap();
        assert_eq!(ids, vec![high, mid, low]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_entry() {
        let index = index();
        let user = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        index.upsert(user, a, 100).await.unwrap();
        index.upsert(user, b, 200).await.unwrap();

        // Re-score a above b: still exactly one entry per post
        index.upsert(user, a, 300).await.unwrap();

        let ids = index.range_descending(user, 0, 9).await.unwrap();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_upsert_many_reaches_every_feed() {
        let index = index();
        let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let post = Uuid::new_v4();

        index.upsert_many(&users, post, 100).await.unwrap();

        for user in users {
            let ids = index.range_descending(user, 0, 0).await.unwrap();
            assert_eq!(ids, vec![post]);
        }
    }

    #[tokio::test]
    async fn test_window_past_end_is_empty() {
        let index = index();
        let user = Uuid::new_v4();

        index.upsert(user, Uuid::new_v4(), 100).await.unwrap();

        assert!(index.range_descending(user, 10, 19).await.unwrap().is_empty());
        assert!(index
            .range_descending(Uuid::new_v4(), 0, 9)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_deletes_the_entry() {
        let index = index();
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        index.upsert(user, post, 100).await.unwrap();
        index.remove(user, post).await.unwrap();

        assert!(index.range_descending(user, 0, 9).await.unwrap().is_empty());
    }
}
