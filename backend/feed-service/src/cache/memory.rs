//! In-process implementation of the key-value capability.
//!
//! Backs the engine in unit and integration tests and in local development
//! without a Redis instance. Semantics match the Redis backend where the
//! engine can observe them: increments treat a missing key as 0, ranked
//! ranges order by descending score with descending member as the
//! tie-break, and range windows past the end return empty.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::ServiceResult;

#[derive(Default)]
struct MemoryInner {
    ints: HashMap<String, i64>,
    sets: HashMap<String, HashSet<String>>,
    ranked: HashMap<String, HashMap<String, i64>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut MemoryInner) -> T) -> T {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        f(&mut inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_int(&self, key: &str) -> ServiceResult<Option<i64>> {
        Ok(self.with_inner(|inner| inner.ints.get(key).copied()))
    }

    async fn set_int(&self, key: &str, value: i64) -> ServiceResult<()> {
        self.with_inner(|inner| {
            inner.ints.insert(key.to_string(), value);
        });
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> ServiceResult<i64> {
        Ok(self.with_inner(|inner| {
            let value = inner.ints.entry(key.to_string()).or_insert(0);
            *value += delta;
            *value
        }))
    }

    async fn decr(&self, key: &str, delta: i64) -> ServiceResult<i64> {
        self.incr(key, -delta).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> ServiceResult<bool> {
        Ok(self.with_inner(|inner| {
            inner
                .sets
                .get(key)
                .map(|set| set.contains(member))
                .unwrap_or(false)
        }))
    }

    async fn add_member_and_incr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64> {
        Ok(self.with_inner(|inner| {
            inner
                .sets
                .entry(set_key.to_string())
                .or_default()
                .insert(member.to_string());
            let value = inner.ints.entry(counter_key.to_string()).or_insert(0);
            *value += 1;
            *value
        }))
    }

    async fn remove_member_and_decr(
        &self,
        set_key: &str,
        member: &str,
        counter_key: &str,
    ) -> ServiceResult<i64> {
        Ok(self.with_inner(|inner| {
            if let Some(set) = inner.sets.get_mut(set_key) {
                set.remove(member);
            }
            let value = inner.ints.entry(counter_key.to_string()).or_insert(0);
            *value -= 1;
            *value
        }))
    }

    async fn ranked_put(&self, key: &str, member: &str, score: i64) -> ServiceResult<()> {
        self.with_inner(|inner| {
            inner
                .ranked
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string(), score);
        });
        Ok(())
    }

    async fn ranked_put_many(
        &self,
        keys: &[String],
        member: &str,
        score: i64,
    ) -> ServiceResult<()> {
        self.with_inner(|inner| {
            for key in keys {
                inner
                    .ranked
                    .entry(key.clone())
                    .or_default()
                    .insert(member.to_string(), score);
            }
        });
        Ok(())
    }

    async fn ranked_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> ServiceResult<Vec<String>> {
        Ok(self.with_inner(|inner| {
            let Some(entries) = inner.ranked.get(key) else {
                return Vec::new();
            };

            let mut ordered: Vec<(&String, i64)> =
                entries.iter().map(|(m, s)| (m, *s)).collect();
            ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));

            let start = start.max(0) as usize;
            if start >= ordered.len() || stop < 0 {
                return Vec::new();
            }
            let stop = (stop as usize).min(ordered.len() - 1);

            ordered[start..=stop]
                .iter()
                .map(|(member, _)| (*member).clone())
                .collect()
        }))
    }

    async fn ranked_remove(&self, key: &str, member: &str) -> ServiceResult<()> {
        self.with_inner(|inner| {
            if let Some(entries) = inner.ranked.get_mut(key) {
                entries.remove(member);
            }
        });
        Ok(())
    }
}
