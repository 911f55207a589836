//! Bot module - event intake, routing and lifecycle.

mod connection;
pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use connection::ConnectionState;
pub use dispatcher::{AppState, EventDispatcher};
pub use runtime::run;
