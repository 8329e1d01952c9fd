//! Protocol modules.
//!
//! - `envelope`: the sequenced message unit and its constructors.
//! - `params`: what the handshake hands to the client.
//! - `codec`: default JSON framing for byte-oriented transports.

pub mod codec;
pub mod envelope;
pub mod params;

pub use envelope::Envelope;
pub use params::ConversationParams;
