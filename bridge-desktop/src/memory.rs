//! In-process Cache Backend
//!
//! Mirrors the subset of Redis semantics the catalog relies on: string, set and
//! sorted-set values, per-key TTL with lazy expiry, `WRONGTYPE` errors on type
//! collisions, glob key matching and atomic rename. Used in tests and in
//! single-process deployments without a Redis server.

use async_trait::async_trait;
use bridge_traits::{
    cache::{CacheBackend, ValueKind},
    error::{BridgeError, Result},
    time::{Clock, SystemClock},
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Value {
    String(String),
    Set(BTreeSet<String>),
    SortedSet(HashMap<String, f64>),
}

impl Value {
    fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Set(_) => ValueKind::Set,
            Value::SortedSet(_) => ValueKind::SortedSet,
        }
    }

    fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::Set(members) => members.is_empty(),
            Value::SortedSet(members) => members.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at_ms: Option<i64>,
}

/// In-memory [`CacheBackend`]
pub struct MemoryCacheBackend {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use an injected clock so expiry can be driven from tests
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, now);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn expiry(&self, ttl: Duration) -> i64 {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.clock.unix_timestamp_millis().saturating_add(ttl_ms)
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, now_ms: i64) {
    entries.retain(|_, entry| entry.expires_at_ms.map_or(true, |at| at > now_ms));
}

/// Live entry for `key`, dropping it first if it has expired
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str, now_ms: i64) -> Option<&'a mut Entry> {
    let expired = entries
        .get(key)
        .and_then(|entry| entry.expires_at_ms)
        .is_some_and(|at| at <= now_ms);
    if expired {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn wrong_type(key: &str) -> BridgeError {
    BridgeError::WrongType {
        key: key.to_string(),
    }
}

/// Redis-style glob match supporting `*` and `?`
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    let (mut p, mut c) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            mark = c;
            p += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            mark += 1;
            c = mark;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::String(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at_ms = ttl.map(|ttl| self.expiry(ttl));
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::String(value.to_string()),
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.unix_timestamp_millis();
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at_ms = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn key_type(&self, key: &str) -> Result<ValueKind> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        Ok(live(&mut entries, key, now)
            .map(|entry| entry.value.kind())
            .unwrap_or(ValueKind::None))
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => {
                set.extend(members.iter().cloned());
                Ok(())
            }
            Some(_) => Err(wrong_type(key)),
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Set(members.iter().cloned().collect()),
                        expires_at_ms: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        let mut removed = 0;
        for key in keys {
            if live(&mut entries, key, now).is_some() {
                entries.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, now);
        let mut matched: Vec<String> = entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        matched.sort();
        Ok(matched)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        if live(&mut entries, from, now).is_none() {
            return Err(BridgeError::OperationFailed(format!(
                "ERR no such key: {}",
                from
            )));
        }
        if let Some(entry) = entries.remove(from) {
            entries.insert(to.to_string(), entry);
        }
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            Some(Entry {
                value: Value::SortedSet(members),
                ..
            }) => {
                members.insert(member.to_string(), score);
                Ok(())
            }
            Some(_) => Err(wrong_type(key)),
            None => {
                let mut members = HashMap::new();
                members.insert(member.to_string(), score);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::SortedSet(members),
                        expires_at_ms: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key, now) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::SortedSet(members),
                ..
            }) => {
                let mut range: Vec<(String, f64)> = members
                    .iter()
                    .filter(|(_, score)| **score >= min && **score <= max)
                    .map(|(member, score)| (member.clone(), *score))
                    .collect();
                range.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Ok(range)
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let now = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock().await;
        let removed = match live(&mut entries, key, now) {
            None => return Ok(0),
            Some(Entry {
                value: Value::SortedSet(members),
                ..
            }) => {
                let before = members.len();
                members.retain(|_, score| *score < min || *score > max);
                (before - members.len()) as u64
            }
            Some(_) => return Err(wrong_type(key)),
        };
        if entries
            .get(key)
            .is_some_and(|entry| entry.value.is_empty_collection())
        {
            entries.remove(key);
        }
        Ok(removed)
    }
}
