//! Drops backlog the server replays after a reconnect.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::bot::ConnectionState;
use crate::message::Message;
use crate::pipeline::{Flow, SequentialHandler};

pub struct StalenessFilter {
    connection: ConnectionState,
}

impl StalenessFilter {
    pub fn new(connection: ConnectionState) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl SequentialHandler for StalenessFilter {
    fn name(&self) -> &'static str {
        "staleness"
    }

    async fn handle(&self, msg: &Arc<Message>) -> Flow {
        if self.connection.is_stale(msg.timestamp) {
            debug!(
                message_id = %msg.id,
                sent_at = %msg.timestamp,
                "Dropping message sent before the current connection"
            );
            return Flow::Stop;
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::message::classify;
    use crate::protocol::testing::{raw_message, text};

    fn message_at(ts: chrono::DateTime<Utc>) -> Arc<Message> {
        let raw = raw_message(
            "M1",
            "6281234567890@s.whatsapp.net",
            "6281234567890@s.whatsapp.net",
            false,
            ts,
            text("hello"),
        );
        Arc::new(classify(raw, None))
    }

    #[tokio::test]
    async fn test_passes_everything_before_first_connection() {
        let filter = StalenessFilter::new(ConnectionState::new());
        let old = message_at(Utc::now() - Duration::days(3));
        assert_eq!(filter.handle(&old).await, Flow::Continue);
    }

    #[tokio::test]
    async fn test_stops_backlog() {
        let connection = ConnectionState::new();
        let connected = Utc::now();
        connection.mark_connected(connected);
        let filter = StalenessFilter::new(connection);

        let backlog = message_at(connected - Duration::minutes(10));
        let live = message_at(connected + Duration::seconds(2));

        assert_eq!(filter.handle(&backlog).await, Flow::Stop);
        assert_eq!(filter.handle(&live).await, Flow::Continue);
    }
}
