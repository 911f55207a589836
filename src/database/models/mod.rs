//! Persisted document models.

pub mod interaction;

pub use interaction::InteractionRecord;
