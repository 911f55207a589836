//! Event dispatcher.
//!
//! Routes every protocol event: lifecycle events update connection state,
//! calls are declined, messages are classified and run through the
//! pipeline.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::ConnectionState;
use crate::config::Config;
use crate::database::InteractionStore;
use crate::handlers::{self, MessageStats};
use crate::message::classify;
use crate::pipeline::{Pipeline, PipelineState, TaskPool};
use crate::protocol::{Jid, RawEvent, Transport};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Outbound protocol operations.
    pub transport: Arc<dyn Transport>,

    /// Last-interaction records for the greeting cooldown.
    pub store: Arc<dyn InteractionStore>,

    /// Time of the last (re)connection.
    pub connection: ConnectionState,

    /// Pool for detached work.
    pub tasks: TaskPool,

    pub stats: MessageStats,
}

impl AppState {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn InteractionStore>,
        tasks: TaskPool,
    ) -> Self {
        Self {
            transport,
            store,
            connection: ConnectionState::new(),
            tasks,
            stats: MessageStats::new(),
        }
    }
}

/// What the runtime should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    /// The session is gone; shut down.
    Terminate { reason: String },
}

pub struct EventDispatcher {
    state: AppState,
    pipeline: Pipeline,
    auto_reject_calls: bool,
}

impl EventDispatcher {
    pub fn new(config: &Config, state: AppState) -> Self {
        let pipeline = handlers::build_pipeline(config, &state);
        Self {
            state,
            pipeline,
            auto_reject_calls: config.auto_reject_calls,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle one event to completion of its sequential work.
    pub async fn dispatch(&self, event: RawEvent) -> Dispatch {
        match event {
            RawEvent::Connected => {
                let now = Utc::now();
                self.state.connection.mark_connected(now);
                info!(connected_at = %now, "Connected");

                if let Err(e) = self.state.transport.refresh_identity().await {
                    warn!("Failed to refresh own identity: {}", e);
                }
            }
            RawEvent::Disconnected => warn!("Disconnected, waiting for the bridge to reconnect"),
            RawEvent::PairSuccess { jid } => info!(device = %jid, "Pairing completed"),
            RawEvent::LoggedOut { reason } => {
                error!(reason = %reason, "Logged out, the session must be paired again");
                return Dispatch::Terminate { reason };
            }
            RawEvent::CallOffer { from, call_id } | RawEvent::CallOfferNotice { from, call_id } => {
                self.on_call(&from, &call_id).await;
            }
            RawEvent::Message(raw) => {
                let identity = self.state.transport.self_identity();
                let msg = classify(raw, identity.as_ref());
                let id = msg.id.clone();

                match self.pipeline.run(msg).await {
                    PipelineState::Completed => debug!(message_id = %id, "Pipeline completed"),
                    state => debug!(message_id = %id, ?state, "Pipeline halted"),
                }
            }
            RawEvent::Ignored => {}
        }

        Dispatch::Continue
    }

    async fn on_call(&self, from: &Jid, call_id: &str) {
        if !self.auto_reject_calls {
            info!(caller = %from, call_id, "Incoming call");
            return;
        }

        match self.state.transport.reject_call(from, call_id).await {
            Ok(()) => info!(caller = %from, call_id, "Call rejected"),
            Err(e) => warn!(caller = %from, call_id, "Failed to reject call: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::database::MemoryInteractionStore;
    use crate::message::{Direction, MessageKind};
    use crate::protocol::testing::{RecordingTransport, jid, raw_message, text};
    use crate::protocol::{OutgoingPayload, Payload};

    const ME: &str = "6280000000001@s.whatsapp.net";
    const CONTACT: &str = "6281234567890@s.whatsapp.net";

    struct Fixture {
        transport: Arc<RecordingTransport>,
        store: MemoryInteractionStore,
        dispatcher: EventDispatcher,
    }

    fn fixture(extra: &[(&str, &str)]) -> Fixture {
        let mut vars: HashMap<String, String> = [
            ("BRIDGE_URL", "http://127.0.0.1:9000"),
            ("STORAGE_BACKEND", "memory"),
            ("GREETING_MESSAGE", "Welcome!"),
            ("SELF_EDIT_DELAY_MS", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let transport = Arc::new(RecordingTransport::new(Some(jid(ME))));
        let store = MemoryInteractionStore::new();
        let state = AppState::new(transport.clone(), Arc::new(store.clone()), TaskPool::new(2, 32));

        Fixture {
            transport,
            store,
            dispatcher: EventDispatcher::new(&config, state),
        }
    }

    fn message_event(id: &str, from_me: bool, ts: DateTime<Utc>, payload: Payload) -> RawEvent {
        let sender = if from_me { ME } else { CONTACT };
        RawEvent::Message(raw_message(id, sender, CONTACT, from_me, ts, payload))
    }

    async fn drain(f: &Fixture) {
        f.dispatcher
            .state()
            .tasks
            .shutdown(Duration::from_secs(1))
            .await;
    }

    #[tokio::test]
    async fn test_connected_marks_time_and_refreshes_identity() {
        let f = fixture(&[]);
        assert_eq!(f.dispatcher.dispatch(RawEvent::Connected).await, Dispatch::Continue);

        assert!(f.dispatcher.state().connection.last_connected().is_some());
        assert_eq!(*f.transport.refreshes.lock(), 1);
    }

    #[tokio::test]
    async fn test_logged_out_terminates() {
        let f = fixture(&[]);
        let outcome = f
            .dispatcher
            .dispatch(RawEvent::LoggedOut {
                reason: "device removed".to_string(),
            })
            .await;
        assert_eq!(
            outcome,
            Dispatch::Terminate {
                reason: "device removed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_calls_are_rejected_when_enabled() {
        let f = fixture(&[]);
        f.dispatcher
            .dispatch(RawEvent::CallOffer {
                from: jid(CONTACT),
                call_id: "CALL1".to_string(),
            })
            .await;
        assert_eq!(
            *f.transport.rejected_calls.lock(),
            vec![(jid(CONTACT), "CALL1".to_string())]
        );

        let f = fixture(&[("AUTO_REJECT_CALLS", "false")]);
        f.dispatcher
            .dispatch(RawEvent::CallOfferNotice {
                from: jid(CONTACT),
                call_id: "CALL2".to_string(),
            })
            .await;
        assert!(f.transport.rejected_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_new_contact_is_greeted_and_counted() {
        let f = fixture(&[]);
        let ts = Utc::now();

        f.dispatcher.dispatch(message_event("M1", false, ts, text("hello"))).await;
        drain(&f).await;

        assert_eq!(
            *f.transport.sends.lock(),
            vec![(jid(CONTACT), OutgoingPayload::text("Welcome!"))]
        );
        assert_eq!(f.store.last_interaction(&jid(CONTACT)).await.unwrap(), Some(ts));
        assert_eq!(
            f.dispatcher.state().stats.count(MessageKind::Text, Direction::Incoming),
            1
        );
    }

    #[tokio::test]
    async fn test_backlog_after_reconnect_is_dropped() {
        let f = fixture(&[]);
        f.dispatcher.dispatch(RawEvent::Connected).await;

        let before = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        f.dispatcher.dispatch(message_event("OLD", false, before, text("hello"))).await;
        drain(&f).await;

        assert!(f.transport.sends.lock().is_empty());
        assert!(f.store.is_empty());
        assert_eq!(f.dispatcher.state().stats.total(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_payload_reaches_no_handler() {
        let f = fixture(&[]);
        f.dispatcher
            .dispatch(message_event("M1", false, Utc::now(), Payload::default()))
            .await;
        drain(&f).await;

        assert!(f.transport.sends.lock().is_empty());
        assert!(f.store.is_empty());
        assert_eq!(f.dispatcher.state().stats.total(), 0);
    }

    #[tokio::test]
    async fn test_outgoing_text_is_wrapped() {
        let f = fixture(&[("HEADER_FOOTER_TEMPLATE", "[Acme]\\n{message}")]);
        f.dispatcher
            .dispatch(message_event("OUT1", true, Utc::now(), text("Order confirmed")))
            .await;
        drain(&f).await;

        assert_eq!(
            *f.transport.edits.lock(),
            vec![(
                jid(CONTACT),
                "OUT1".to_string(),
                OutgoingPayload::text("[Acme]\nOrder confirmed")
            )]
        );
        assert!(f.transport.sends.lock().is_empty());
    }

    #[tokio::test]
    async fn test_no_template_means_no_edit() {
        let f = fixture(&[]);
        f.dispatcher
            .dispatch(message_event("OUT1", true, Utc::now(), text("Order confirmed")))
            .await;
        drain(&f).await;

        assert!(f.transport.edits.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_events() {
        let f = fixture(&[]);
        assert_eq!(f.dispatcher.dispatch(RawEvent::Ignored).await, Dispatch::Continue);
        assert_eq!(f.dispatcher.dispatch(RawEvent::Disconnected).await, Dispatch::Continue);
    }
}
