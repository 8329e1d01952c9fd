//! Conversation parameters produced by the handshake.

use serde::{Deserialize, Serialize};

/// Result of starting a conversation with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationParams {
    /// Stable identifier, unique among live conversations.
    pub conversation_id: String,
    /// Default wait budget of a blocking receive. Zero means "use the client default".
    #[serde(default)]
    pub client_timeout_millis: u64,
    /// Advisory only; never enforced here.
    #[serde(default)]
    pub server_work_queue_size_at_startup: usize,
}

impl ConversationParams {
    pub fn new(
        conversation_id: impl Into<String>,
        client_timeout_millis: u64,
        server_work_queue_size_at_startup: usize,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            client_timeout_millis,
            server_work_queue_size_at_startup,
        }
    }
}
