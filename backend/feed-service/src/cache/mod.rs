//! Key-value store capability used by the counter cache and the feed index.
//!
//! The engine never talks to Redis directly: every component takes an
//! explicitly constructed `Arc<dyn KeyValueStore>`, so tests and local
//! development can run on [`MemoryStore`] while production wires up
//! [`RedisStore`]. The trait covers exactly the primitives the engine
//! needs; atomicity guarantees (increment-from-zero, the paired
//! membership-and-count moves) are part of the contract, not an
//! implementation detail.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::error::ServiceResult;
use async_trait::async_trait;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read an integer value; None on a missing key
    async fn get_int(&self, key: &str) -> ServiceResult<Option<i64>>;

    /// Write an integer value, replacing any previous one
    async fn set_int(&self, key: &str, value: i64) -> ServiceResult<()>;

    /// Atomically add `delta` to a counter, treating a missing key as 0,
    /// and return the post-increment value
    async fn incr(&self, key: &str, delta: i64) -> ServiceResult<i64>;

    /// Atomically subtract `delta` from a counter and return the
    /// post-decrement value. May go negative on a stale or missing entry;
    /// callers clamp before use.
    async fn decr(&self, key: &str, delta: i64) -> ServiceResult<i64>;

    /// Membership test on a set key
    async fn set_contains(&self, key: &str, member: &str) -> ServiceResult<bool>;

    /// Add `member` to a set and increment a counter as one
    /// atomically-executed batch; returns the post-increment count.
    /// Both writes apply or neither does.
    async fn add_member_and_incr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64>;

    /// Remove `member` from a set and decrement a counter as one
    /// atomically-executed batch; returns the post-decrement count
    /// (unclamped).
    async fn remove_member_and_decr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64>;

    /// Insert or replace `member` in a ranked set. Re-putting the same
    /// member with the same score is a no-op in effect.
    async fn ranked_put(&self, key: &str, member: &str, score: i64) -> ServiceResult<()>;

    /// Same write against many ranked-set keys in one pipelined request
    async fn ranked_put_many(&self, keys: &[String], member: &str, score: i64)
        -> ServiceResult<()>;

    /// Members of a ranked set ordered by descending score, for the closed
    /// index window `[start, stop]`. Empty when the window is past the end.
    async fn ranked_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> ServiceResult<Vec<String>>;

    /// Remove `member` from a ranked set
    async fn ranked_remove(&self, key: &str, member: &str) -> ServiceResult<()>;
}
