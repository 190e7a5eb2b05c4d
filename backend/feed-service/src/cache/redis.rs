//! Redis-backed implementation of the key-value capability.
//!
//! Holds a `ConnectionManager` (cheap to clone, reconnects internally) and
//! maps every Redis failure to `ServiceError::CacheUnavailable` via the
//! error conversion in `crate::error`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::KeyValueStore;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to Redis and wrap the managed connection
    pub async fn connect(redis_url: &str) -> ServiceResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get_int(&self, key: &str) -> ServiceResult<Option<i64>> {
        let value: Option<i64> = self.conn.clone().get(key).await?;
        Ok(value)
    }

    async fn set_int(&self, key: &str, value: i64) -> ServiceResult<()> {
        let _: () = self.conn.clone().set(key, value).await?;
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> ServiceResult<i64> {
        let value: i64 = self.conn.clone().incr(key, delta).await?;
        Ok(value)
    }

    async fn decr(&self, key: &str, delta: i64) -> ServiceResult<i64> {
        let value: i64 = self.conn.clone().decr(key, delta).await?;
        Ok(value)
    }

    async fn set_contains(&self, key: &str, member: &str) -> ServiceResult<bool> {
        let contained: bool = self.conn.clone().sismember(key, member).await?;
        Ok(contained)
    }

    async fn add_member_and_incr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64> {
        // MULTI/EXEC so the set and the count can never be observed apart
        let mut pipe = redis::pipe();
        pipe.atomic()
            .sadd(set_key, member)
            .ignore()
            .incr(counter_key, 1i64);

        let (count,): (i64,) = pipe.query_async(&mut self.conn.clone()).await?;
        Ok(count)
    }

    async fn remove_member_and_decr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .srem(set_key, member)
            .ignore()
            .decr(counter_key, 1i64);

        let (count,): (i64,) = pipe.query_async(&mut self.conn.clone()).await?;
        Ok(count)
    }

    async fn ranked_put(&self, key: &str, member: &str, score: i64) -> ServiceResult<()> {
        let _: () = self.conn.clone().zadd(key, member, score).await?;
        Ok(())
    }

    async fn ranked_put_many(
        &self,
        keys: &[String],
        member: &str,
        score: i64,
    ) -> ServiceResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.zadd(key, member, score).ignore();
        }
        let _: () = pipe.query_async(&mut self.conn.clone()).await?;
        Ok(())
    }

    async fn ranked_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> ServiceResult<Vec<String>> {
        let members: Vec<String> = self.conn.clone().zrevrange(key, start, stop).await?;
        Ok(members)
    }

    async fn ranked_remove(&self, key: &str, member: &str) -> ServiceResult<()> {
        let _: () = self.conn.clone().zrem(key, member).await?;
        Ok(())
    }
}
