//! Core traits and types for the caching system.

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Persistent key-value store holding structured records.
///
/// Keys are opaque strings; values are arbitrary JSON documents.
pub trait KeyValueStore: Send + Sync {
  /// Get the value stored under `key`, if any.
  fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;
}

/// A cached record together with the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  /// Epoch milliseconds at write time
  pub timestamp: i64,
  pub data: T,
}

impl<T> CacheEntry<T> {
  /// Whether the entry is still younger than `ttl_ms` at `now_ms`.
  ///
  /// An age that cannot be represented counts as stale.
  pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
    now_ms
      .checked_sub(self.timestamp)
      .is_some_and(|age| age < ttl_ms)
  }
}
