//! Persistent caching of repository stats.
//!
//! This module provides:
//! - A `KeyValueStore` abstraction over the persistent store (SQLite or no-op)
//! - `StatsCache`, which stamps records on write and enforces a time-to-live on read
//! - Fail-open behavior: any storage error reads as a miss and never reaches the user

mod layer;
mod storage;
mod traits;

pub use layer::StatsCache;
pub use storage::{NoopStorage, SqliteStorage};
pub use traits::KeyValueStore;
