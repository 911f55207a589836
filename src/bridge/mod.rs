//! HTTP client for the protocol bridge.
//!
//! The bridge owns the chat session. We call it to send, edit and reject
//! calls, and ask it who we are logged in as.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::protocol::{Jid, OutgoingPayload, Receipt, Transport, TransportError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct SendRequest<'a> {
    chat: &'a Jid,
    payload: &'a OutgoingPayload,
}

#[derive(Serialize)]
struct EditRequest<'a> {
    chat: &'a Jid,
    message_id: &'a str,
    payload: &'a OutgoingPayload,
}

#[derive(Serialize)]
struct RejectCallRequest<'a> {
    caller: &'a Jid,
    call_id: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(default)]
    jid: Option<Jid>,
}

pub struct BridgeTransport {
    client: Client,
    base: Url,
    token: Option<String>,
    identity: RwLock<Option<Jid>>,
}

impl BridgeTransport {
    pub fn new(mut base: Url, token: Option<String>) -> Result<Self, TransportError> {
        // Relative joins replace the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            token,
            identity: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.endpoint(path)?).json(body);
        let response = check(self.authorize(request).send().await?).await?;
        Ok(response.json().await?)
    }
}

/// Map non-2xx responses to [`TransportError::Status`].
async fn check(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn send(&self, chat: &Jid, payload: OutgoingPayload) -> Result<Receipt, TransportError> {
        let receipt: Receipt = self
            .post("messages", &SendRequest { chat, payload: &payload })
            .await?;
        debug!(chat = %chat, id = %receipt.id, "Message sent");
        Ok(receipt)
    }

    async fn edit(
        &self,
        chat: &Jid,
        message_id: &str,
        payload: OutgoingPayload,
    ) -> Result<Receipt, TransportError> {
        self.post(
            "messages/edit",
            &EditRequest {
                chat,
                message_id,
                payload: &payload,
            },
        )
        .await
    }

    async fn reject_call(&self, caller: &Jid, call_id: &str) -> Result<(), TransportError> {
        let request = self
            .client
            .post(self.endpoint("calls/reject")?)
            .json(&RejectCallRequest { caller, call_id });
        check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    fn self_identity(&self) -> Option<Jid> {
        self.identity.read().clone()
    }

    async fn refresh_identity(&self) -> Result<(), TransportError> {
        let request = self.client.get(self.endpoint("session")?);
        let response = check(self.authorize(request).send().await?).await?;
        let session: SessionResponse = response.json().await?;

        let Some(jid) = session.jid else {
            *self.identity.write() = None;
            return Err(TransportError::NotPaired);
        };

        info!(identity = %jid, "Logged in");
        *self.identity.write() = Some(jid.to_non_device());
        Ok(())
    }
}
