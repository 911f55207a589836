//! Repository module - MongoDB data access.

mod interaction_repository;

pub use interaction_repository::InteractionRepository;
