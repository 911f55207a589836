//! In-process caching on top of Moka.
//!
//! Repositories keep a [`TypedCache`] in front of their collection so the
//! per-message hot path does not hit the database for every lookup.

mod typed;

use std::time::Duration;

pub use typed::TypedCache;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Entries older than this are evicted.
    pub ttl: Option<Duration>,

    /// Entries not read within this duration are evicted.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Config for per-contact interaction timestamps.
    ///
    /// Active contacts tend to write in bursts, so idle entries are dropped
    /// quickly while the TTL bounds staleness when another process writes
    /// the same collection.
    pub fn interactions() -> Self {
        Self {
            max_capacity: 20_000,
            ttl: Some(Duration::from_secs(1800)), // 30 minutes
            tti: Some(Duration::from_secs(600)),  // 10 minutes idle
        }
    }
}
