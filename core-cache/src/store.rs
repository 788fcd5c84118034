//! Key-value cache store
//!
//! Thin wrapper over a [`CacheBackend`] that adds JSON helpers, an explicit
//! type check for schemaless keys, and bounded retries. Only transient
//! backend failures (connection, timeout) are retried, with delays of
//! `base * 2^attempt`; wrong-type and serialization errors fail at once.

use bridge_traits::cache::{CacheBackend, ValueKind};
use bridge_traits::error::Result as BridgeResult;
use core_runtime::config::CacheConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    retry_attempts: u32,
    retry_base_delay: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self::with_retry(backend, config.retry_attempts, config.retry_base_delay)
    }

    pub fn with_retry(backend: Arc<dyn CacheBackend>, attempts: u32, base_delay: Duration) -> Self {
        Self {
            backend,
            retry_attempts: attempts.max(1),
            retry_base_delay: base_delay,
        }
    }

    async fn retry<T, F, Fut>(&self, command: &'static str, key: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let err = CacheError::from(err);
                    attempt += 1;
                    if !err.is_transient() || attempt >= self.retry_attempts {
                        if err.is_transient() {
                            warn!(command, key, attempts = attempt, error = %err, "Cache command failed");
                        }
                        return Err(err);
                    }

                    let delay = self
                        .retry_base_delay
                        .saturating_mul(2u32.saturating_pow(attempt - 1));
                    debug!(
                        command,
                        key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying cache command"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.retry("GET", key, || self.backend.get(key)).await
    }

    /// Read and deserialize a JSON value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.retry("SET", key, || self.backend.set(key, value, ttl)).await
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw, ttl).await
    }

    /// Delete a key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let keys = [key.to_string()];
        Ok(self.delete_many(&keys).await? > 0)
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let first = keys[0].as_str();
        self.retry("DEL", first, || self.backend.del(keys)).await
    }

    pub async fn members(&self, key: &str) -> Result<Vec<String>> {
        self.retry("SMEMBERS", key, || self.backend.smembers(key)).await
    }

    pub async fn add_to_set(&self, key: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.retry("SADD", key, || self.backend.sadd(key, ids)).await
    }

    /// Fail with [`CacheError::TypeMismatch`] unless `key` is absent or holds
    /// a value of `expected` type.
    pub async fn verify_type(&self, key: &str, expected: ValueKind) -> Result<()> {
        let actual = self.retry("TYPE", key, || self.backend.key_type(key)).await?;
        if actual == ValueKind::None || actual == expected {
            return Ok(());
        }

        warn!(key, %expected, %actual, "Cache key type collision");
        Err(CacheError::TypeMismatch {
            key: key.to_string(),
            expected,
            actual,
        })
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.retry("EXPIRE", key, || self.backend.expire(key, ttl)).await
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.retry("RENAME", from, || self.backend.rename(from, to)).await
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.retry("KEYS", pattern, || self.backend.keys(pattern)).await
    }

    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.retry("ZADD", key, || self.backend.zadd(key, member, score)).await
    }

    pub async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        self.retry("ZRANGEBYSCORE", key, || self.backend.zrange_by_score(key, min, max))
            .await
    }

    pub async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.retry("ZREMRANGEBYSCORE", key, || {
            self.backend.zrem_range_by_score(key, min, max)
        })
        .await
    }
}
