/// Error types for feed-service
use actix_web::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The key-value store is unreachable. Counters and feed order depend
    /// on it, so this is surfaced as service-degraded rather than being
    /// papered over with durable-store reads.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] redis::RedisError),

    #[error("Post not found: {0}")]
    PostNotFound(Uuid),

    #[error("Comment not found: {0}")]
    CommentNotFound(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// HTTP status the transport layer should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::PostNotFound(_) | ServiceError::CommentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl actix_web::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        ServiceError::status_code(self)
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let post_id = Uuid::new_v4();

        assert_eq!(
            ServiceError::PostNotFound(post_id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::CommentNotFound(post_id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Forbidden("not the comment owner".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::InvalidInput("bad cursor".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_cache_unavailable_is_service_degraded() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
        let err = ServiceError::from(redis_err);

        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
