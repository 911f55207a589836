//! Concierge - greeting and self-edit overlay for a chat account.
//!
//! Sits behind a protocol bridge that owns the chat session. The bridge
//! posts every event to our webhook; we answer through its HTTP API.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `logging` - tracing setup with phone-number redaction
//! - `protocol` - Identities, raw events and the transport trait
//! - `bridge` - HTTP transport to the bridge
//! - `message` - Raw event classification
//! - `database` - Interaction store (MongoDB or in-memory)
//! - `cache` - Moka caches in front of the database
//! - `pipeline` - Handler chain and supervised task pool
//! - `handlers` - Filters, audit, greeting, self-edit, stats
//! - `bot` - Event routing, webhook server and lifecycle

mod bot;
mod bridge;
mod cache;
mod config;
mod database;
mod handlers;
mod logging;
mod message;
mod pipeline;
mod protocol;

use std::sync::Arc;

use tracing::{info, warn};

use bot::{AppState, EventDispatcher};
use bridge::BridgeTransport;
use config::{Config, StorageBackend};
use database::{Database, InteractionRepository, InteractionStore, MemoryInteractionStore};
use pipeline::TaskPool;
use protocol::Transport;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    info!("Starting Concierge...");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!(
        "Greeting cooldown: {}h, self-edit: {}",
        config.greeting_cooldown_hours,
        if config.wrap_template.is_some() { "on" } else { "off" }
    );

    // Interaction store
    let store: Arc<dyn InteractionStore> = match &config.storage {
        StorageBackend::MongoDb { uri, database } => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, database).await?;
            let repo = InteractionRepository::new(&db);
            repo.ensure_indexes().await?;
            info!("Database connected");
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory interaction store, greeting history is lost on restart");
            Arc::new(MemoryInteractionStore::new())
        }
    };

    // Bridge transport
    let transport = BridgeTransport::new(config.bridge_url.clone(), config.bridge_token.clone())?;
    if let Err(e) = transport.refresh_identity().await {
        // The bridge may still be pairing; Connected triggers another refresh
        warn!("Own identity not known yet: {}", e);
    }
    let transport: Arc<dyn Transport> = Arc::new(transport);
    info!("Bridge client initialized for {}", config.bridge_url);

    let tasks = TaskPool::new(config.task_workers, config.task_queue_capacity);
    let state = AppState::new(transport, store, tasks);
    let dispatcher = EventDispatcher::new(&config, state);

    bot::run(&config, dispatcher).await
}
