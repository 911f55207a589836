//! Bot runtime: webhook server plus orderly shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use super::dispatcher::EventDispatcher;
use super::webhook::{self, WebhookState};
use crate::config::Config;

/// Serve the webhook until Ctrl+C or a logout.
///
/// Either way the task pool is drained (bounded by the configured grace
/// period) before returning. A logout is returned as an error so the
/// process exits non-zero.
pub async fn run(config: &Config, dispatcher: EventDispatcher) -> anyhow::Result<()> {
    let dispatcher = Arc::new(dispatcher);
    let (terminate_tx, mut terminate_rx) = watch::channel(None::<String>);
    let app = webhook::router(WebhookState::new(
        Arc::clone(&dispatcher),
        config.webhook_secret.clone(),
        terminate_tx,
    ));

    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set, accepting events from any caller");
    }

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind webhook listener on {}", config.listen_addr))?;
    info!("📡 Listening for bridge events on {}", config.listen_addr);

    let shutdown_rx = terminate_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
                _ = terminate_rx.wait_for(|reason| reason.is_some()) => {}
            }
        })
        .await
        .context("webhook server exited unexpectedly")?;

    let state = dispatcher.state();
    let report = state.tasks.shutdown(config.shutdown_grace).await;
    info!(
        drained = report.drained,
        aborted = report.aborted_workers,
        cancelled = report.cancelled_delayed,
        messages = %state.stats.summary(),
        "Shutdown complete"
    );

    let reason = shutdown_rx.borrow().clone();
    match reason {
        Some(reason) => anyhow::bail!("session logged out: {}", reason),
        None => Ok(()),
    }
}
