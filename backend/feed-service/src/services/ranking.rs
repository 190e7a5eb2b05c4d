//! Rank score computation for feed entries.
//!
//! Engagement is modeled as extra recency: every like makes a post rank as
//! if it were posted 5 seconds later, every comment 8 seconds later. A
//! single descending read of the ranked feed then yields a recency-biased,
//! engagement-boosted order without any decay job.

/// Recency boost per like, in milliseconds
pub const LIKE_WEIGHT_MS: i64 = 5_000;

/// Recency boost per comment, in milliseconds
pub const COMMENT_WEIGHT_MS: i64 = 8_000;

/// Compute the rank score of a post from its immutable creation time and
/// its current engagement counters.
///
/// Pure and deterministic: the same inputs always produce the same score,
/// so re-running it after any engagement event converges every follower's
/// feed entry to the same value.
pub fn compute_score(created_at_millis: i64, like_count: i64, comment_count: i64) -> i64 {
    created_at_millis + like_count * LIKE_WEIGHT_MS + comment_count * COMMENT_WEIGHT_MS
}
