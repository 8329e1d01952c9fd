//! Transport boundary.
//!
//! Two collaborators live outside this crate:
//! - the message transport, which moves envelopes in both directions;
//! - the conversation setup (handshake), which yields `ConversationParams`.
//!
//! Inbound, the transport hands every envelope to
//! `ConversationMultiplexer::send`, so the multiplexer is itself a
//! `MessageTransport`.

pub mod loopback;

use std::sync::Arc;

use async_trait::async_trait;

use parley_core::error::Result;
use parley_core::{ConversationParams, Envelope};

pub use loopback::{EnvelopeReceiver, LoopbackTransport};

/// One-way envelope delivery. Must not block on the network.
pub trait MessageTransport: Send + Sync {
    fn send(&self, envelope: Envelope) -> Result<()>;
}

impl<T: MessageTransport + ?Sized> MessageTransport for Arc<T> {
    fn send(&self, envelope: Envelope) -> Result<()> {
        (**self).send(envelope)
    }
}

/// Handshake with the remote service.
#[async_trait]
pub trait ConversationSetup: Send + Sync {
    async fn start_conversation(&self, service_type: &str) -> Result<ConversationParams>;
}
