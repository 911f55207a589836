//! Database module exports.

mod models;
mod mongo;
mod repository;
mod store;

pub use mongo::Database;
pub use repository::InteractionRepository;
pub use store::{InteractionStore, MemoryInteractionStore, StoreError};
