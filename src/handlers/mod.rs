//! Message handlers.
//!
//! Add a new handler by:
//! 1. Creating a new file in this directory
//! 2. Adding `mod your_handler;` below
//! 3. Registering it in `build_pipeline()` at the right position
//!
//! Sequential handlers run in registration order. Filters go first so the
//! rest never see messages they would have to ignore.

mod audit;
mod greeting;
mod self_edit;
mod staleness;
mod stats;
mod unsupported;

pub use audit::AuditLog;
pub use greeting::GreetingHandler;
pub use self_edit::SelfEditHandler;
pub use staleness::StalenessFilter;
pub use stats::MessageStats;
pub use unsupported::UnsupportedFilter;

use tracing::info;

use crate::bot::AppState;
use crate::config::Config;
use crate::pipeline::Pipeline;

/// Build the message pipeline.
///
/// Order: staleness filter, unsupported filter, audit log, greeting, self
/// edit. The self edit is left out when no wrap template is configured.
pub fn build_pipeline(config: &Config, state: &AppState) -> Pipeline {
    let mut builder = Pipeline::builder()
        .sequential(StalenessFilter::new(state.connection.clone()))
        .sequential(UnsupportedFilter)
        .sequential(AuditLog)
        .sequential(GreetingHandler::new(
            state.store.clone(),
            state.transport.clone(),
            config.greeting_message.clone(),
            config.greeting_cooldown(),
        ));

    match &config.wrap_template {
        Some(template) => {
            builder = builder.sequential(SelfEditHandler::new(
                state.transport.clone(),
                template.clone(),
                config.self_edit_delay,
                state.tasks.clone(),
            ));
        }
        None => info!("HEADER_FOOTER_TEMPLATE not set, outgoing self-edit disabled"),
    }

    let pipeline = builder.parallel(state.stats.clone()).build(state.tasks.clone());
    info!(handlers = ?pipeline.sequential_names(), "Message pipeline ready");
    pipeline
}
