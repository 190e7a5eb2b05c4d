pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};

// Re-export the engine components
pub use services::{
    CounterService, EngagementService, FanoutService, FeedIndex, FollowOutcome, HomeFeedService,
    LikeOutcome, UnfollowOutcome, UnlikeOutcome,
};
