//! Logging setup.
//!
//! Plain `tracing` + `tracing-subscriber` fmt output, routed through
//! [`RedactingMakeWriter`] so identities do not land in logs in full.

mod redact;

use tracing_subscriber::EnvFilter;

pub use redact::RedactingMakeWriter;

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("concierge=info,mongodb=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RedactingMakeWriter::new(std::io::stdout))
        .init();
}
