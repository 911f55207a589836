//! Webhook endpoint the protocol bridge posts events to.
//!
//! - `POST /events` takes one JSON event and answers once its sequential
//!   handlers have finished, so the bridge naturally paces delivery
//! - `GET /health` reports connection state
//!
//! When a secret is configured, every event must carry it in the
//! `X-Bridge-Secret` header.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::watch;
use tracing::warn;

use super::dispatcher::{Dispatch, EventDispatcher};
use crate::protocol::RawEvent;

pub const SECRET_HEADER: &str = "x-bridge-secret";

/// State shared by the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<EventDispatcher>,
    secret: Option<Arc<str>>,
    /// Set to the logout reason when the session terminates.
    terminate: Arc<watch::Sender<Option<String>>>,
}

impl WebhookState {
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        secret: Option<String>,
        terminate: watch::Sender<Option<String>>,
    ) -> Self {
        Self {
            dispatcher,
            secret: secret.map(Arc::from),
            terminate: Arc::new(terminate),
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.secret.as_deref() else {
            return true;
        };
        headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|provided| provided == expected)
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/events", post(handle_event))
        .route("/health", get(handle_health))
        .with_state(state)
}

async fn handle_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(event): Json<RawEvent>,
) -> Response {
    if !state.authorized(&headers) {
        warn!("Rejected event with missing or wrong secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid secret" })),
        )
            .into_response();
    }

    match state.dispatcher.dispatch(event).await {
        Dispatch::Continue => (StatusCode::ACCEPTED, Json(json!({ "status": "ok" }))).into_response(),
        Dispatch::Terminate { reason } => {
            state.terminate.send_replace(Some(reason));
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "terminating" })),
            )
                .into_response()
        }
    }
}

async fn handle_health(State(state): State<WebhookState>) -> Json<serde_json::Value> {
    let app = state.dispatcher.state();
    Json(json!({
        "status": "ok",
        "connected_at": app.connection.last_connected(),
        "paired": app.transport.self_identity().is_some(),
        "messages": app.stats.total(),
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::bot::AppState;
    use crate::config::Config;
    use crate::database::MemoryInteractionStore;
    use crate::pipeline::TaskPool;
    use crate::protocol::testing::{RecordingTransport, jid};

    fn setup(secret: Option<&str>) -> (Router, Arc<RecordingTransport>, watch::Receiver<Option<String>>) {
        let vars: HashMap<&str, &str> = [
            ("BRIDGE_URL", "http://127.0.0.1:9000"),
            ("STORAGE_BACKEND", "memory"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        let transport = Arc::new(RecordingTransport::new(Some(jid("6280000000001@s.whatsapp.net"))));
        let state = AppState::new(
            transport.clone(),
            Arc::new(MemoryInteractionStore::new()),
            TaskPool::new(1, 8),
        );
        let dispatcher = Arc::new(EventDispatcher::new(&config, state));

        let (tx, rx) = watch::channel(None);
        let app = router(WebhookState::new(dispatcher, secret.map(str::to_string), tx));
        (app, transport, rx)
    }

    fn post_event(body: Value, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/events")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_message_event() {
        let (app, transport, _rx) = setup(None);
        let event = json!({
            "type": "message",
            "info": {
                "id": "M1",
                "sender": "6281234567890@s.whatsapp.net",
                "chat": "6281234567890@s.whatsapp.net",
                "timestamp": "2026-10-19T09:00:00Z"
            },
            "message": { "conversation": "hello" }
        });

        let response = app.oneshot(post_event(event, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(transport.sent_to(), vec![jid("6281234567890@s.whatsapp.net")]);
    }

    #[tokio::test]
    async fn test_secret_is_enforced() {
        let (app, _transport, _rx) = setup(Some("s3cret"));

        let response = app
            .clone()
            .oneshot(post_event(json!({ "type": "connected" }), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(post_event(json!({ "type": "connected" }), Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_event(json!({ "type": "connected" }), Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_logged_out_signals_termination() {
        let (app, _transport, rx) = setup(None);

        let response = app
            .oneshot(post_event(
                json!({ "type": "logged_out", "reason": "device removed" }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(json_body(response).await["status"], "terminating");
        assert_eq!(rx.borrow().as_deref(), Some("device removed"));
    }

    #[tokio::test]
    async fn test_unknown_event_types_are_accepted() {
        let (app, _transport, rx) = setup(None);
        let response = app
            .oneshot(post_event(json!({ "type": "presence", "from": "x" }), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_health_reports_connection() {
        let (app, _transport, _rx) = setup(None);

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["connected_at"].is_null());
        assert_eq!(body["paired"], true);

        app.clone()
            .oneshot(post_event(json!({ "type": "connected" }), None))
            .await
            .unwrap();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(json_body(response).await["connected_at"].is_string());
    }
}
