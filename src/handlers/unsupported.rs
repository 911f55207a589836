//! Drops messages no later handler can act on.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::message::{Message, MessageKind};
use crate::pipeline::{Flow, SequentialHandler};

/// Stops unsupported payloads and anything posted by a newsletter.
pub struct UnsupportedFilter;

#[async_trait]
impl SequentialHandler for UnsupportedFilter {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    async fn handle(&self, msg: &Arc<Message>) -> Flow {
        if msg.kind == MessageKind::Unsupported {
            debug!(message_id = %msg.id, "Dropping unsupported message");
            return Flow::Stop;
        }

        if msg.is_newsletter_origin {
            debug!(message_id = %msg.id, newsletter = %msg.sender_key, "Dropping newsletter post");
            return Flow::Stop;
        }

        Flow::Continue
    }
}
