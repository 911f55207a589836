//! Connection bookkeeping for the staleness filter.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

const NEVER: i64 = i64::MIN;

/// Time of the last successful (re)connection.
///
/// Written only by the event dispatcher on `Connected`, read by the
/// staleness filter. Clones share the same value.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    last_connected_ms: Arc<AtomicI64>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            last_connected_ms: Arc::new(AtomicI64::new(NEVER)),
        }
    }

    pub fn mark_connected(&self, at: DateTime<Utc>) {
        self.last_connected_ms
            .store(at.timestamp_millis(), Ordering::Release);
    }

    /// `None` until the first connection.
    pub fn last_connected(&self) -> Option<DateTime<Utc>> {
        match self.last_connected_ms.load(Ordering::Acquire) {
            NEVER => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Whether a message sent at `timestamp` predates the current connection,
    /// i.e. it is backlog replayed by the server after a reconnect.
    pub fn is_stale(&self, timestamp: DateTime<Utc>) -> bool {
        self.last_connected()
            .is_some_and(|connected| timestamp < connected)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
