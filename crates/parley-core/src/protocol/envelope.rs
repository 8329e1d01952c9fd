//! Envelope: the addressed, sequenced unit of transport.
//!
//! One envelope carries exactly one of:
//! - an ordinary payload (any JSON value),
//! - a progress string (side channel, never handed to the application),
//! - an exception signal (`exception = true`), with the remote description as
//!   a string payload, or without payload when it ends the conversation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const TERMINATED_DESCRIPTION: &str = "conversation terminated";

/// Immutable message unit exchanged over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    conversation_id: String,
    seq: u64,
    #[serde(default)]
    exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    progress: Option<String>,
}

impl Envelope {
    /// Ordinary payload envelope.
    pub fn message(conversation_id: impl Into<String>, seq: u64, payload: Value) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            seq,
            exception: false,
            payload: Some(payload),
            progress: None,
        }
    }

    /// Envelope without payload (the "no value" reply).
    pub fn empty(conversation_id: impl Into<String>, seq: u64) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            seq,
            exception: false,
            payload: None,
            progress: None,
        }
    }

    /// Progress notification.
    pub fn progress(conversation_id: impl Into<String>, seq: u64, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            seq,
            exception: false,
            payload: None,
            progress: Some(text.into()),
        }
    }

    /// Out-of-band error signal carrying a textual description.
    pub fn exception(
        conversation_id: impl Into<String>,
        seq: u64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            seq,
            exception: true,
            payload: Some(Value::String(description.into())),
            progress: None,
        }
    }

    /// End-of-conversation signal.
    pub fn terminate(conversation_id: impl Into<String>, seq: u64) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            seq,
            exception: true,
            payload: None,
            progress: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_exception(&self) -> bool {
        self.exception
    }

    pub fn is_terminate(&self) -> bool {
        self.exception && self.payload.is_none()
    }

    pub fn is_progress(&self) -> bool {
        self.progress.is_some()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn progress_text(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Remote-supplied error text. `None` for non-exception envelopes.
    pub fn exception_description(&self) -> Option<String> {
        if !self.exception {
            return None;
        }
        Some(match &self.payload {
            None => TERMINATED_DESCRIPTION.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
    }

    /// Consume the envelope and return its payload.
    pub fn into_payload(self) -> Option<Value> {
        self.payload
    }
}
