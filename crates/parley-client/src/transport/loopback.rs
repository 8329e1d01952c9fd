//! In-process transport backed by an unbounded tokio channel.
//!
//! Useful to wire a client to an in-process service, and in tests. The
//! duplicating variant sends every envelope twice, which models an
//! at-least-once transport.

use tokio::sync::mpsc;

use parley_core::error::{ParleyError, Result};
use parley_core::Envelope;

use crate::transport::MessageTransport;

/// Receiving end of a loopback transport.
pub type EnvelopeReceiver = mpsc::UnboundedReceiver<Envelope>;

#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<Envelope>,
    duplicate: bool,
}

impl LoopbackTransport {
    pub fn channel() -> (Self, EnvelopeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, duplicate: false }, rx)
    }

    /// Like `channel`, but every envelope is delivered twice.
    pub fn duplicating() -> (Self, EnvelopeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, duplicate: true }, rx)
    }

    fn forward(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(envelope)
            .map_err(|_| ParleyError::Transport("loopback receiver dropped".into()))
    }
}

impl MessageTransport for LoopbackTransport {
    fn send(&self, envelope: Envelope) -> Result<()> {
        if self.duplicate {
            self.forward(envelope.clone())?;
        }
        self.forward(envelope)
    }
}
