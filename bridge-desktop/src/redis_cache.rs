//! Cache Backend Implementation using Redis

use async_trait::async_trait;
use bridge_traits::{
    cache::{CacheBackend, ValueKind},
    error::{BridgeError, Result},
};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

/// Redis-backed [`CacheBackend`]
///
/// Uses a multiplexed [`ConnectionManager`], which reconnects on its own after
/// a dropped connection; clones share the same underlying connection.
#[derive(Clone)]
pub struct RedisCacheBackend {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheBackend {
    /// Connect to the Redis server at `redis_url` (e.g. `redis://127.0.0.1:6379`)
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(map_redis_error)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        info!("Connected to Redis cache backend");
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }

    fn score_arg(score: f64) -> String {
        if score == f64::NEG_INFINITY {
            "-inf".to_string()
        } else if score == f64::INFINITY {
            "+inf".to_string()
        } else {
            score.to_string()
        }
    }
}

/// Map a redis error onto the bridge taxonomy
fn map_redis_error(error: redis::RedisError) -> BridgeError {
    if error.code() == Some("WRONGTYPE") {
        return BridgeError::WrongType {
            key: error.detail().unwrap_or_default().to_string(),
        };
    }
    if error.is_timeout() {
        return BridgeError::Timeout(error.to_string());
    }
    if error.is_io_error() || error.is_connection_dropped() || error.is_connection_refusal() {
        return BridgeError::Connection(error.to_string());
    }
    BridgeError::OperationFailed(error.to_string())
}

fn with_key(error: BridgeError, key: &str) -> BridgeError {
    match error {
        BridgeError::WrongType { .. } => BridgeError::WrongType {
            key: key.to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .get(key)
            .await
            .map_err(|e| with_key(map_redis_error(e), key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn();
        match ttl {
            Some(ttl) => conn
                .set_ex(key, value, ttl.as_secs().max(1))
                .await
                .map_err(map_redis_error),
            None => conn.set(key, value).await.map_err(map_redis_error),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let seconds = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);
        self.conn()
            .expire(key, seconds)
            .await
            .map_err(map_redis_error)
    }

    async fn key_type(&self, key: &str) -> Result<ValueKind> {
        let name: String = redis::cmd("TYPE")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(map_redis_error)?;
        Ok(ValueKind::from_type_name(&name))
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let _: i64 = self
            .conn()
            .sadd(key, members)
            .await
            .map_err(|e| with_key(map_redis_error(e), key))?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.conn()
            .smembers(key)
            .await
            .map_err(|e| with_key(map_redis_error(e), key))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.conn().del(keys).await.map_err(map_redis_error)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        // SCAN instead of KEYS so large keyspaces don't block the server.
        let mut conn = self.conn();
        let mut cursor = 0u64;
        let mut found = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
            found.extend(batch);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        found.sort();
        found.dedup();
        debug!(pattern, count = found.len(), "Scanned keys");
        Ok(found)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.conn().rename(from, to).await.map_err(map_redis_error)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let _: i64 = self
            .conn()
            .zadd(key, member, score)
            .await
            .map_err(|e| with_key(map_redis_error(e), key))?;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        self.conn()
            .zrangebyscore_withscores(key, Self::score_arg(min), Self::score_arg(max))
            .await
            .map_err(|e| with_key(map_redis_error(e), key))
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.conn()
            .zrembyscore(key, Self::score_arg(min), Self::score_arg(max))
            .await
            .map_err(|e| with_key(map_redis_error(e), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_arguments() {
        assert_eq!(RedisCacheBackend::score_arg(f64::NEG_INFINITY), "-inf");
        assert_eq!(RedisCacheBackend::score_arg(f64::INFINITY), "+inf");
        assert_eq!(RedisCacheBackend::score_arg(1500.0), "1500");
    }
}
