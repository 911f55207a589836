//! One structured log line per accepted message.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::message::Message;
use crate::pipeline::{Flow, SequentialHandler};

/// Never stops the pipeline. Phone numbers in the output are masked by the
/// redacting log writer.
pub struct AuditLog;

#[async_trait]
impl SequentialHandler for AuditLog {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn handle(&self, msg: &Arc<Message>) -> Flow {
        info!(
            message_id = %msg.id,
            kind = %msg.kind,
            direction = %msg.direction,
            from = %msg.sender_key,
            to = %msg.recipient_key,
            group = msg.is_group,
            content = %msg.content,
            "Message"
        );
        Flow::Continue
    }
}
