pub mod counters;
pub mod engagement;
pub mod fanout;
pub mod feed_index;
pub mod home_feed;
pub mod ranking;

pub use counters::CounterService;
pub use engagement::{
    EngagementService, FollowOutcome, LikeOutcome, UnfollowOutcome, UnlikeOutcome,
};
pub use fanout::FanoutService;
pub use feed_index::FeedIndex;
pub use home_feed::HomeFeedService;
