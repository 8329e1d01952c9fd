//! Shared error type across parley crates.

use thiserror::Error;

/// Caller-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The remote side signaled an exception.
    RemoteExecution,
    /// A blocking receive ran out of time.
    Timeout,
    /// Payload did not match the expected type.
    TypeMismatch,
    /// Inbound envelope for a conversation nobody registered.
    UnknownConversation,
    /// Conversation id registered twice.
    DuplicateConversation,
    /// Operation on a closed conversation.
    ConversationClosed,
    /// Transport refused the envelope.
    Transport,
    /// Encoding or decoding failed.
    Codec,
    /// Configuration rejected.
    BadConfig,
    /// Unsupported version.
    UnsupportedVersion,
}

impl ErrorCode {
    /// String representation used in logs and by transports.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::RemoteExecution => "REMOTE_EXECUTION",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::UnknownConversation => "UNKNOWN_CONVERSATION",
            ErrorCode::DuplicateConversation => "DUPLICATE_CONVERSATION",
            ErrorCode::ConversationClosed => "CONVERSATION_CLOSED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Codec => "CODEC",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ParleyError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// The description is remote text (usually a stack trace), not a structured error.
    #[error("remote execution failed in conversation {conversation_id}: {description}")]
    RemoteExecution {
        conversation_id: String,
        description: String,
    },
    #[error("conversation {conversation_id} timed out after {timeout_ms} ms")]
    Timeout {
        conversation_id: String,
        timeout_ms: u64,
    },
    #[error("unexpected payload type in conversation {conversation_id}: {detail}")]
    TypeMismatch {
        conversation_id: String,
        detail: String,
    },
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),
    #[error("conversation already registered: {0}")]
    DuplicateConversation(String),
    #[error("conversation closed: {0}")]
    ConversationClosed(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("codec: {0}")]
    Codec(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version")]
    UnsupportedVersion,
}

impl ParleyError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ParleyError::RemoteExecution { .. } => ErrorCode::RemoteExecution,
            ParleyError::Timeout { .. } => ErrorCode::Timeout,
            ParleyError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ParleyError::UnknownConversation(_) => ErrorCode::UnknownConversation,
            ParleyError::DuplicateConversation(_) => ErrorCode::DuplicateConversation,
            ParleyError::ConversationClosed(_) => ErrorCode::ConversationClosed,
            ParleyError::Transport(_) => ErrorCode::Transport,
            ParleyError::Codec(_) => ErrorCode::Codec,
            ParleyError::BadConfig(_) => ErrorCode::BadConfig,
            ParleyError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
        }
    }

    /// Conversation the error belongs to, when it is tied to one.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ParleyError::RemoteExecution { conversation_id, .. }
            | ParleyError::Timeout { conversation_id, .. }
            | ParleyError::TypeMismatch { conversation_id, .. } => Some(conversation_id),
            ParleyError::UnknownConversation(id)
            | ParleyError::DuplicateConversation(id)
            | ParleyError::ConversationClosed(id) => Some(id),
            _ => None,
        }
    }
}
