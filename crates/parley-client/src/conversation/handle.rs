//! Conversation handle: the application-facing side of one conversation.
//!
//! Lifecycle: `Open` until `close` (or drop, or the idle reaper), then
//! `Closed` for good. Operations on a closed handle fail with
//! `ConversationClosed`.
//!
//! A remote exception is a one-shot event. `receive` reports it when it is
//! next in the inbox; `send` checks the sticky flag first, so a caller that
//! only produces still learns that the far side failed.

use std::any::type_name;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;

use parley_core::error::{ParleyError, Result};
use parley_core::{ConversationParams, Envelope};

use crate::conversation::multiplexer::{ConversationMultiplexer, ConversationSlot, UseGuard};
use crate::transport::MessageTransport;

pub struct Conversation {
    params: ConversationParams,
    timeout: Duration,
    slot: Arc<ConversationSlot>,
    multiplexer: Arc<ConversationMultiplexer>,
    transport: Arc<dyn MessageTransport>,
    // Held across the transport send so sequence order equals wire order.
    outgoing_seq: Mutex<u64>,
    progress: watch::Sender<Option<String>>,
}

impl Conversation {
    /// Build a handle and register its inbox with `multiplexer`.
    pub fn open(
        params: ConversationParams,
        timeout: Duration,
        multiplexer: Arc<ConversationMultiplexer>,
        transport: Arc<dyn MessageTransport>,
    ) -> Result<Self> {
        let slot = Arc::new(ConversationSlot::new());
        multiplexer.add_conversation(params.conversation_id.clone(), Arc::clone(&slot))?;
        let (progress, _) = watch::channel(None);
        Ok(Self {
            params,
            timeout,
            slot,
            multiplexer,
            transport,
            outgoing_seq: Mutex::new(0),
            progress,
        })
    }

    pub fn id(&self) -> &str {
        &self.params.conversation_id
    }

    pub fn server_work_queue_size_at_startup(&self) -> usize {
        self.params.server_work_queue_size_at_startup
    }

    /// Wait budget of `receive`.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }

    /// Latest progress text reported by the remote side.
    pub fn subscribe_progress(&self) -> watch::Receiver<Option<String>> {
        self.progress.subscribe()
    }

    /// Send one message, after surfacing any pending remote error.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        let _in_use = self.pin()?;

        if self.slot.take_exception_signal() {
            if let Some(env) = self.slot.inbox().take_exception() {
                return Err(self.remote_error(&env));
            }
        }

        let payload = serde_json::to_value(message)
            .map_err(|e| ParleyError::Codec(format!("payload encode failed: {e}")))?;
        self.transmit(|seq| Envelope::message(self.id(), seq, payload))
    }

    /// Block until a message arrives or the conversation timeout elapses.
    ///
    /// On timeout the remote side is told (best effort) that this client gave up.
    pub async fn receive<T: DeserializeOwned>(&self) -> Result<T> {
        let _in_use = self.pin()?;

        match self.next_envelope(self.timeout).await {
            Some(env) => self.unpack(env),
            None => {
                let timeout_ms = self.timeout.as_millis() as u64;
                self.notify_timeout(timeout_ms);
                Err(ParleyError::Timeout {
                    conversation_id: self.id().to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Like `receive`, but a timeout yields `Ok(None)` and nothing is sent.
    pub async fn try_receive<T: DeserializeOwned>(&self, timeout: Duration) -> Result<Option<T>> {
        let _in_use = self.pin()?;

        match self.next_envelope(timeout).await {
            Some(env) => self.unpack(env).map(Some),
            None => Ok(None),
        }
    }

    /// Tell the remote side to end the conversation. Does not unregister.
    pub fn terminate(&self) -> Result<()> {
        let _in_use = self.pin()?;
        tracing::debug!(conversation = %self.id(), "terminating conversation");
        self.transmit(|seq| Envelope::terminate(self.id(), seq))
    }

    /// Stop listening locally. Idempotent; returns `true` on the first call.
    pub fn close(&self) -> bool {
        if !self.slot.mark_closed() {
            return false;
        }
        self.multiplexer.remove_slot(self.id(), &self.slot);
        tracing::debug!(conversation = %self.id(), "conversation closed");
        true
    }

    /// Keep the conversation open for the duration of one operation.
    fn pin(&self) -> Result<UseGuard<'_>> {
        self.slot
            .begin_use()
            .ok_or_else(|| ParleyError::ConversationClosed(self.id().to_string()))
    }

    fn transmit(&self, build: impl FnOnce(u64) -> Envelope) -> Result<()> {
        let mut next = self.outgoing_seq.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = *next;
        // A sequence number is spent even if the transport fails, so a partial
        // delivery is never shadowed by a later reuse.
        *next += 1;
        self.transport.send(build(seq))
    }

    /// Next non-progress envelope before one overall deadline.
    async fn next_envelope(&self, timeout: Duration) -> Option<Envelope> {
        let deadline = Instant::now() + timeout;
        loop {
            let env = self.slot.inbox().poll_until(deadline).await?;
            match env.progress_text() {
                Some(text) => {
                    tracing::debug!(conversation = %self.id(), seq = env.seq(), progress = %text, "progress");
                    self.progress.send_replace(Some(text.to_string()));
                }
                None => return Some(env),
            }
        }
    }

    fn unpack<T: DeserializeOwned>(&self, env: Envelope) -> Result<T> {
        if env.is_exception() {
            self.slot.clear_exception_signal();
            return Err(self.remote_error(&env));
        }
        let payload = env.into_payload().unwrap_or(Value::Null);
        serde_json::from_value(payload).map_err(|e| ParleyError::TypeMismatch {
            conversation_id: self.id().to_string(),
            detail: format!("expected {}: {e}", type_name::<T>()),
        })
    }

    fn remote_error(&self, env: &Envelope) -> ParleyError {
        ParleyError::RemoteExecution {
            conversation_id: self.id().to_string(),
            description: env.exception_description().unwrap_or_default(),
        }
    }

    fn notify_timeout(&self, timeout_ms: u64) {
        let description = format!(
            "TimeoutException: client gave up waiting for conversation {} after {timeout_ms} ms",
            self.id()
        );
        if let Err(e) = self.transmit(|seq| Envelope::exception(self.id(), seq, description)) {
            tracing::warn!(conversation = %self.id(), error = %e, "failed to notify remote side of client timeout");
        }
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.id())
            .field("timeout", &self.timeout)
            .field("closed", &self.is_closed())
            .finish()
    }
}
