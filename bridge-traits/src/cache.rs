//! Key-Value Cache Backend Abstraction
//!
//! A command-style interface over an external in-memory store with string,
//! set and sorted-set values and explicit TTL support. Redis satisfies it;
//! so does the in-process store used by tests.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Type of the value stored under a key, as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Key does not exist (or has expired)
    None,
    String,
    Set,
    SortedSet,
    Other(String),
}

impl ValueKind {
    /// Parse a backend type name (`"string"`, `"set"`, `"zset"`, `"none"`)
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "none" => ValueKind::None,
            "string" => ValueKind::String,
            "set" => ValueKind::Set,
            "zset" => ValueKind::SortedSet,
            other => ValueKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::None => write!(f, "none"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Set => write!(f, "set"),
            ValueKind::SortedSet => write!(f, "zset"),
            ValueKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Cache backend trait
///
/// Implementations must report a type collision (e.g. `sadd` on a string key)
/// as [`BridgeError::WrongType`](crate::error::BridgeError::WrongType) and
/// connectivity problems as `Connection`/`Timeout` so callers can decide
/// whether to retry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a string value; `None` for a missing or expired key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a string value, replacing any previous value and TTL
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Set a TTL on an existing key. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Report the type of value stored under `key`
    async fn key_type(&self, key: &str) -> Result<ValueKind>;

    /// Add members to a set, creating it if needed
    async fn sadd(&self, key: &str, members: &[String]) -> Result<()>;

    /// All members of a set; empty for a missing key
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Delete keys, returning how many existed
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// Keys matching a glob-style pattern (`*` wildcard)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Atomically rename `from` to `to`, overwriting `to`
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Add (or re-score) a sorted-set member
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Members with scores in `[min, max]`, ascending by score.
    /// Infinite bounds mean unbounded.
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>>;

    /// Remove members with scores in `[min, max]`, returning how many were removed
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64>;
}
