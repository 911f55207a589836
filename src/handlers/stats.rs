//! Per-kind message counters.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::message::{Direction, Message, MessageKind};
use crate::pipeline::ParallelHandler;

/// Counts messages that made it through the sequential phase.
/// Clones share the counters.
#[derive(Debug, Clone, Default)]
pub struct MessageStats {
    counts: Arc<DashMap<(MessageKind, Direction), u64>>,
}

impl MessageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: MessageKind, direction: Direction) -> u64 {
        self.counts
            .get(&(kind, direction))
            .map(|c| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }

    /// `KIND/DIRECTION=n` pairs sorted for stable output.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .counts
            .iter()
            .map(|entry| {
                let (kind, direction) = entry.key();
                format!("{}/{}={}", kind, direction, entry.value())
            })
            .collect();
        parts.sort();
        parts.join(" ")
    }
}

#[async_trait]
impl ParallelHandler for MessageStats {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn handle(&self, msg: Arc<Message>) -> anyhow::Result<()> {
        let mut count = self.counts.entry((msg.kind, msg.direction)).or_insert(0);
        *count += 1;
        debug!(kind = %msg.kind, direction = %msg.direction, count = *count, "Message counted");
        Ok(())
    }
}
