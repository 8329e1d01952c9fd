//! parley core: transport-agnostic conversation primitives and error types.
//!
//! This crate defines the envelope contract and the error surface shared by
//! the client and by transport implementations. It carries no async runtime so
//! transports built on any executor can reuse it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed frames
//! surface as `ParleyError::Codec` instead of crashing the dispatch thread.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

pub use error::{ErrorCode, ParleyError, Result};
pub use protocol::{ConversationParams, Envelope};
