//! parley client library.
//!
//! Opens many independent conversations with a remote service over one
//! asynchronous message transport. Per conversation it adds ordering,
//! duplicate suppression, timeouts, progress filtering and remote error
//! propagation on top of a transport that offers none of those.
//!
//! ```text
//! transport --deliver--> ConversationMultiplexer --push--> Inbox <--poll-- Conversation
//! Conversation --send--> transport
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod config;
pub mod conversation;
pub mod transport;

pub use client::ConversationClient;
pub use conversation::{Conversation, ConversationMultiplexer, IdleReaper, Inbox};
pub use transport::{ConversationSetup, LoopbackTransport, MessageTransport};
