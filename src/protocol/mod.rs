//! Protocol boundary.
//!
//! The chat protocol itself (pairing, encryption, device sync) lives behind
//! a bridge process. This module holds the shapes exchanged with it:
//! identities, raw events and the [`Transport`] operation set.

mod event;
mod jid;
mod transport;

#[cfg(test)]
pub mod testing;

pub use event::{Payload, RawEvent, RawMessage};
#[cfg(test)]
pub use event::{
    AudioMessage, DocumentMessage, ExtendedText, MediaMessage, MessageInfo, StickerMessage,
};
pub use jid::Jid;
pub use transport::{OutgoingPayload, Receipt, Transport, TransportError};
