pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod records;

pub use comments::CommentRepository;
pub use follows::FollowRepository;
pub use likes::LikeRepository;
pub use posts::PostRepository;
pub use records::{PgRecordStore, RecordStore};

#[cfg(test)]
pub use records::MockRecordStore;
