//! Conversation client: one multiplexer, one transport, many conversations.

use std::sync::Arc;
use std::time::Duration;

use parley_core::error::Result;
use parley_core::ConversationParams;

use crate::config::ClientConfig;
use crate::conversation::{Conversation, ConversationMultiplexer, IdleReaper};
use crate::transport::{ConversationSetup, MessageTransport};

#[derive(Clone)]
pub struct ConversationClient {
    multiplexer: Arc<ConversationMultiplexer>,
    transport: Arc<dyn MessageTransport>,
    setup: Arc<dyn ConversationSetup>,
    cfg: Arc<ClientConfig>,
}

impl ConversationClient {
    /// Build a client. The config is validated here as well as in the loader,
    /// since its fields can be set in code.
    pub fn new(
        setup: Arc<dyn ConversationSetup>,
        transport: Arc<dyn MessageTransport>,
        cfg: ClientConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            multiplexer: Arc::new(ConversationMultiplexer::new()),
            transport,
            setup,
            cfg: Arc::new(cfg),
        })
    }

    pub fn cfg(&self) -> &ClientConfig {
        &self.cfg
    }

    /// Where the transport delivers inbound envelopes.
    pub fn incoming(&self) -> Arc<ConversationMultiplexer> {
        Arc::clone(&self.multiplexer)
    }

    /// Handshake with the remote service, then open the conversation.
    pub async fn start_conversation(&self, service_type: &str) -> Result<Conversation> {
        let params = self.setup.start_conversation(service_type).await?;
        tracing::debug!(
            service_type,
            conversation = %params.conversation_id,
            "conversation started"
        );
        self.open(params)
    }

    /// Open a conversation from parameters obtained elsewhere.
    pub fn open(&self, params: ConversationParams) -> Result<Conversation> {
        let timeout = match params.client_timeout_millis {
            0 => self.cfg.client.default_timeout(),
            ms => Duration::from_millis(ms),
        };
        Conversation::open(
            params,
            timeout,
            Arc::clone(&self.multiplexer),
            Arc::clone(&self.transport),
        )
    }

    pub fn active_conversations(&self) -> usize {
        self.multiplexer.len()
    }

    /// Start the idle reaper if the config enables it.
    pub fn spawn_reaper(&self) -> Option<IdleReaper> {
        let r = &self.cfg.reaper;
        if !r.enabled {
            return None;
        }
        Some(IdleReaper::spawn(
            &self.multiplexer,
            r.grace_period(),
            r.sweep_interval(),
        ))
    }
}
