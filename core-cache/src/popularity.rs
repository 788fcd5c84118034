//! Per-track popularity history
//!
//! Samples live in a sorted set scored by timestamp, one member per sample
//! encoded as `{timestamp_ms}:{popularity}`. Every write prunes samples that
//! have left the rolling window, so pruning is idempotent and reads never see
//! more than one window of data.

use bridge_traits::cache::ValueKind;
use bridge_traits::time::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::keys::CacheKeys;
use crate::models::PopularitySample;
use crate::store::CacheStore;

#[derive(Clone)]
pub struct PopularityTracker {
    store: CacheStore,
    keys: CacheKeys,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl PopularityTracker {
    pub fn new(store: CacheStore, keys: CacheKeys, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            keys,
            window,
            clock,
        }
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Oldest timestamp that is still outside the window
    fn cutoff(&self) -> i64 {
        self.clock
            .unix_timestamp_millis()
            .saturating_sub(self.window_ms())
    }

    /// Append a sample stamped with the current time
    pub async fn record(&self, track_id: &str, popularity: u32) -> Result<()> {
        let now = self.clock.unix_timestamp_millis();
        self.record_at(track_id, popularity, now).await
    }

    pub async fn record_at(&self, track_id: &str, popularity: u32, timestamp_ms: i64) -> Result<()> {
        let key = self.keys.popularity(track_id);
        self.store.verify_type(&key, ValueKind::SortedSet).await?;

        let member = format!("{}:{}", timestamp_ms, popularity);
        self.store.zadd(&key, &member, timestamp_ms as f64).await?;

        let pruned = self
            .store
            .zrem_range_by_score(&key, f64::NEG_INFINITY, self.cutoff() as f64)
            .await?;
        if pruned > 0 {
            debug!(track_id, pruned, "Pruned popularity samples");
        }

        self.store.expire(&key, self.window).await?;
        Ok(())
    }

    /// Samples within `[from, to]` (either bound optional), oldest first.
    /// Never returns anything older than the window.
    pub async fn history(
        &self,
        track_id: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<PopularitySample>> {
        let key = self.keys.popularity(track_id);
        let floor = self.cutoff().saturating_add(1);
        let min = from.map_or(floor, |from| from.max(floor));
        let max = to.map_or(f64::INFINITY, |to| to as f64);

        let members = self.store.zrange_by_score(&key, min as f64, max).await?;
        let mut samples: Vec<PopularitySample> = members
            .iter()
            .filter_map(|(member, _)| parse_sample(member))
            .collect();
        samples.sort_by_key(|sample| sample.timestamp_ms);
        Ok(samples)
    }
}

fn parse_sample(member: &str) -> Option<PopularitySample> {
    let (ts, popularity) = member.split_once(':')?;
    Some(PopularitySample {
        timestamp_ms: ts.parse().ok()?,
        popularity: popularity.parse().ok()?,
    })
}
