//! Greeting with cooldown.
//!
//! The first private message from a contact, or the first one after the
//! cooldown has elapsed, gets a canned greeting. Every qualifying message
//! refreshes the contact's last-interaction time, so an ongoing
//! conversation never triggers a second greeting.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::database::InteractionStore;
use crate::message::Message;
use crate::pipeline::{Flow, SequentialHandler};
use crate::protocol::{OutgoingPayload, Transport};

/// Source of "now" for cooldown decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Greet when the contact is new or was last seen at least `cooldown` ago.
pub fn should_greet(last: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now - last >= cooldown,
    }
}

pub struct GreetingHandler {
    store: Arc<dyn InteractionStore>,
    transport: Arc<dyn Transport>,
    message: String,
    cooldown: Duration,
    clock: Clock,
}

impl GreetingHandler {
    pub fn new(
        store: Arc<dyn InteractionStore>,
        transport: Arc<dyn Transport>,
        message: impl Into<String>,
        cooldown: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            message: message.into(),
            cooldown,
            clock: system_clock(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn greet(&self, msg: &Message) {
        let contact = &msg.sender_key;
        match self
            .transport
            .send(contact, OutgoingPayload::text(self.message.as_str()))
            .await
        {
            Ok(receipt) => info!(contact = %contact, receipt = %receipt.id, "Greeting sent"),
            Err(e) => warn!(contact = %contact, "Failed to send greeting: {}", e),
        }
    }
}

#[async_trait]
impl SequentialHandler for GreetingHandler {
    fn name(&self) -> &'static str {
        "greeting"
    }

    async fn handle(&self, msg: &Arc<Message>) -> Flow {
        if !msg.is_incoming() || msg.is_group {
            return Flow::Continue;
        }

        let contact = &msg.sender_key;

        if msg.is_newsletter_origin {
            debug!(contact = %contact, "Newsletter origin, not greeting");
        } else {
            let last = match self.store.last_interaction(contact).await {
                Ok(last) => last,
                Err(e) => {
                    // Fail open: no greeting, no record, the message continues
                    error!(contact = %contact, "Failed to read last interaction: {}", e);
                    return Flow::Continue;
                }
            };

            if should_greet(last, (self.clock)(), self.cooldown) {
                self.greet(msg).await;
            } else {
                debug!(contact = %contact, "Within greeting cooldown");
            }
        }

        if let Err(e) = self.store.record_interaction(contact, msg.timestamp).await {
            error!(contact = %contact, "Failed to record interaction: {}", e);
        }

        Flow::Continue
    }
}
