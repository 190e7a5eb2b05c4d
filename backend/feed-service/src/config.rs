/// Configuration management for feed-service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Feed read/fan-out tuning
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port for health checks
    pub http_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
}

/// Feed tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size used when the caller does not send one
    #[serde(default = "default_page_limit")]
    pub default_limit: i64,
    /// Upper bound on the page size a caller may request
    #[serde(default = "default_max_page_limit")]
    pub max_limit: i64,
    /// Follower feed writes batched per pipelined request
    #[serde(default = "default_fanout_batch_size")]
    pub fanout_batch_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
            fanout_batch_size: default_fanout_batch_size(),
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_page_limit() -> i64 {
    10
}

fn default_max_page_limit() -> i64 {
    100
}

fn default_fanout_batch_size() -> usize {
    128
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8004), // feed-service default HTTP port
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connections),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_connections),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL")
                .context("REDIS_URL environment variable not set")?,
        };

        let feed = FeedConfig {
            default_limit: std::env::var("FEED_DEFAULT_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_page_limit),
            max_limit: std::env::var("FEED_MAX_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_page_limit),
            fanout_batch_size: std::env::var("FEED_FANOUT_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_fanout_batch_size),
        };

        Ok(Config {
            app,
            database,
            redis,
            feed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_default_values() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("REDIS_URL", "redis://localhost");
        std::env::remove_var("FEED_DEFAULT_LIMIT");
        std::env::remove_var("FEED_MAX_LIMIT");
        std::env::remove_var("FEED_FANOUT_BATCH_SIZE");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8004);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert_eq!(config.feed.default_limit, 10);
        assert_eq!(config.feed.max_limit, 100);
        assert_eq!(config.feed.fanout_batch_size, 128);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("REDIS_URL");
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_redis_url_is_an_error() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::remove_var("REDIS_URL");

        assert!(Config::from_env().is_err());

        std::env::remove_var("DATABASE_URL");
    }
}
