//! Outgoing self-edit.
//!
//! Text we send from any of our devices is edited shortly afterwards to
//! carry the configured header and footer. The edit is queued on the task
//! pool once the delay has passed, so neither the pipeline nor a worker
//! waits for it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::WrapTemplate;
use crate::message::{Message, MessageKind};
use crate::pipeline::{Flow, SequentialHandler, TaskPool};
use crate::protocol::{OutgoingPayload, Payload, Transport};

pub struct SelfEditHandler {
    transport: Arc<dyn Transport>,
    template: WrapTemplate,
    delay: Duration,
    tasks: TaskPool,
}

impl SelfEditHandler {
    pub fn new(
        transport: Arc<dyn Transport>,
        template: WrapTemplate,
        delay: Duration,
        tasks: TaskPool,
    ) -> Self {
        Self {
            transport,
            template,
            delay,
            tasks,
        }
    }
}

/// Replacement payload in the same shape as the original, so quote and
/// mention context survive the edit.
fn edited_payload(original: &Payload, text: String) -> OutgoingPayload {
    match &original.extended_text {
        Some(ext) if original.conversation.as_deref().is_none_or(str::is_empty) => {
            OutgoingPayload::ExtendedText {
                text,
                context_info: ext.context_info.clone(),
            }
        }
        _ => OutgoingPayload::Conversation { text },
    }
}

#[async_trait]
impl SequentialHandler for SelfEditHandler {
    fn name(&self) -> &'static str {
        "self_edit"
    }

    async fn handle(&self, msg: &Arc<Message>) -> Flow {
        if !msg.is_outgoing() || msg.kind != MessageKind::Text {
            return Flow::Continue;
        }

        // Our own edit comes back as an outgoing text too
        if self.template.is_wrapped(&msg.content) {
            debug!(message_id = %msg.id, "Already wrapped");
            return Flow::Continue;
        }

        let payload = edited_payload(&msg.raw.message, self.template.wrap(&msg.content));
        let transport = Arc::clone(&self.transport);
        let chat = msg.recipient.clone();
        let message_id = msg.id.clone();
        let delay = self.delay;

        self.tasks.submit_after("self_edit", delay, async move {
            match transport.edit(&chat, &message_id, payload).await {
                Ok(_) => info!(message_id = %message_id, chat = %chat, "Outgoing message wrapped"),
                Err(e) => warn!(message_id = %message_id, chat = %chat, "Failed to edit outgoing message: {}", e),
            }
        });

        Flow::Continue
    }
}
