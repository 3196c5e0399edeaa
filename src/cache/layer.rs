//! Stats cache with time-to-live on top of a key-value store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::traits::{CacheEntry, KeyValueStore};
use crate::github::{RepoIdentifier, RepoStats};

/// Maps repository identifiers to timestamped stats records.
///
/// Expired entries are ignored but left in storage; the next successful fetch
/// overwrites them. Storage failures are logged and treated as misses.
pub struct StatsCache {
  storage: Arc<dyn KeyValueStore>,
  /// How long before cached data is considered stale
  ttl: Duration,
  namespace: String,
}

impl StatsCache {
  /// Create a new cache with a one hour TTL.
  pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
    Self {
      storage,
      ttl: Duration::from_secs(60 * 60),
      namespace: "github_superstats".to_string(),
    }
  }

  /// Set the time-to-live for cached stats.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Set the key prefix.
  pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
    self.namespace = namespace.into();
    self
  }

  /// Storage key for `id`: `<namespace>_<owner>_<name>`.
  pub fn cache_key(&self, id: &RepoIdentifier) -> String {
    format!("{}_{}_{}", self.namespace, id.owner(), id.name())
  }

  fn ttl_ms(&self) -> i64 {
    i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
  }

  pub fn get(&self, id: &RepoIdentifier) -> Option<RepoStats> {
    self.get_at(id, Utc::now())
  }

  /// Look up `id` as of `now`; stale, missing and unreadable entries are misses.
  pub fn get_at(&self, id: &RepoIdentifier, now: DateTime<Utc>) -> Option<RepoStats> {
    let key = self.cache_key(id);

    let value = match self.storage.get(&key) {
      Ok(Some(value)) => value,
      Ok(None) => {
        tracing::debug!("Cache miss for {}", key);
        return None;
      }
      Err(e) => {
        tracing::warn!("Cache read for {} failed, refetching: {}", key, e);
        return None;
      }
    };

    let entry: CacheEntry<RepoStats> = match serde_json::from_value(value) {
      Ok(entry) => entry,
      Err(e) => {
        tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e);
        return None;
      }
    };

    if entry.is_fresh(now.timestamp_millis(), self.ttl_ms()) {
      tracing::debug!("Cache hit for {}", key);
      Some(entry.data)
    } else {
      tracing::debug!("Cache entry for {} expired", key);
      None
    }
  }

  pub fn put(&self, id: &RepoIdentifier, stats: &RepoStats) {
    self.put_at(id, stats, Utc::now());
  }

  /// Write `stats` for `id` stamped with `now`, replacing any earlier entry.
  pub fn put_at(&self, id: &RepoIdentifier, stats: &RepoStats, now: DateTime<Utc>) {
    let key = self.cache_key(id);
    let entry = CacheEntry {
      timestamp: now.timestamp_millis(),
      data: stats,
    };

    let result = serde_json::to_value(&entry)
      .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize stats: {}", e))
      .and_then(|value| self.storage.set(&key, &value));

    if let Err(e) = result {
      tracing::warn!("Cache write for {} failed: {}", key, e);
    }
  }
}

impl Clone for StatsCache {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
      namespace: self.namespace.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;
  use chrono::Duration as ChronoDuration;
  use color_eyre::{eyre::eyre, Result};

  struct BrokenStorage;

  impl KeyValueStore for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<serde_json::Value>> {
      Err(eyre!("disk on fire"))
    }

    fn set(&self, _key: &str, _value: &serde_json::Value) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
  }

  fn stats() -> RepoStats {
    RepoStats::new(10, 20, 3, "main".to_string(), 4)
  }

  fn id() -> RepoIdentifier {
    RepoIdentifier::new("octo", "cat").unwrap()
  }

  fn cache() -> (StatsCache, Arc<SqliteStorage>) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    (StatsCache::new(storage.clone()), storage)
  }

  #[test]
  fn test_cache_key_format() {
    let (cache, _) = cache();
    assert_eq!(cache.cache_key(&id()), "github_superstats_octo_cat");
    let cache = cache.with_namespace("ns");
    assert_eq!(cache.cache_key(&id()), "ns_octo_cat");
  }

  #[test]
  fn test_round_trip_within_ttl() {
    let (cache, _) = cache();
    cache.put(&id(), &stats());
    assert_eq!(cache.get(&id()), Some(stats()));
  }

  #[test]
  fn test_expired_entry_is_absent_but_kept() {
    let (cache, storage) = cache();
    let written = Utc::now();
    cache.put_at(&id(), &stats(), written);

    let just_before = written + ChronoDuration::milliseconds(3_599_999);
    assert_eq!(cache.get_at(&id(), just_before), Some(stats()));

    let at_ttl = written + ChronoDuration::hours(1);
    assert_eq!(cache.get_at(&id(), at_ttl), None);

    // Not evicted
    assert!(storage.get(&cache.cache_key(&id())).unwrap().is_some());
  }

  #[test]
  fn test_newer_write_supersedes() {
    let (cache, _) = cache();
    let old = Utc::now() - ChronoDuration::hours(2);
    cache.put_at(&id(), &stats(), old);
    assert_eq!(cache.get(&id()), None);

    let fresh = RepoStats::new(1, 1, 1, "trunk".to_string(), 0);
    cache.put(&id(), &fresh);
    assert_eq!(cache.get(&id()), Some(fresh));
  }

  #[test]
  fn test_custom_ttl() {
    let (cache, _) = cache();
    let cache = cache.with_ttl(Duration::from_secs(60));
    let written = Utc::now();
    cache.put_at(&id(), &stats(), written);
    assert_eq!(
      cache.get_at(&id(), written + ChronoDuration::seconds(61)),
      None
    );
  }

  #[test]
  fn test_entries_are_per_repository() {
    let (cache, _) = cache();
    cache.put(&id(), &stats());
    let other = RepoIdentifier::new("octo", "dog").unwrap();
    assert_eq!(cache.get(&other), None);
  }

  #[test]
  fn test_storage_failures_fail_open() {
    let cache = StatsCache::new(Arc::new(BrokenStorage));
    cache.put(&id(), &stats());
    assert_eq!(cache.get(&id()), None);
  }

  #[test]
  fn test_corrupt_timestamp_is_miss() {
    let (cache, storage) = cache();
    let entry = CacheEntry {
      timestamp: i64::MIN,
      data: stats(),
    };
    storage
      .set(
        &cache.cache_key(&id()),
        &serde_json::to_value(&entry).unwrap(),
      )
      .unwrap();
    assert_eq!(cache.get(&id()), None);
  }

  #[test]
  fn test_unreadable_entry_is_miss() {
    let (cache, storage) = cache();
    storage
      .set(&cache.cache_key(&id()), &serde_json::json!({"garbage": true}))
      .unwrap();
    assert_eq!(cache.get(&id()), None);
  }
}
