use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cached value plus the time it was written (unix millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry<T> {
    pub data: T,
    pub cached_at: i64,
}

impl<T> CachedEntry<T> {
    pub fn new(data: T, cached_at: i64) -> Self {
        Self { data, cached_at }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.cached_at)
    }

    /// Younger than `window`. Entries stamped in the future count as fresh.
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_ms) < window_ms
    }
}

/// Where a read-through result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Fresh cached copy
    Cache,
    /// Fetched from upstream and written back
    Upstream,
    /// Upstream failed; a stale cached copy was served
    CacheFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Upstream => "upstream",
            Source::CacheFallback => "cache-fallback",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub entity: T,
    pub source: Source,
}

/// One point of a popularity time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularitySample {
    pub timestamp_ms: i64,
    pub popularity: u32,
}
