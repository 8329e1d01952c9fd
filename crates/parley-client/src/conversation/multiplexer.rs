//! Conversation multiplexer: routes inbound envelopes to the right inbox.
//!
//! - `conversation_id -> ConversationSlot`
//! - one instance per transport, explicitly constructed and owned (no global)
//!
//! The registry is a sharded map, so opening or closing one conversation never
//! serializes delivery to unrelated ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use parley_core::error::{ParleyError, Result};
use parley_core::Envelope;

use crate::conversation::inbox::Inbox;
use crate::transport::MessageTransport;

// Closed flag, in-use count and idle clock change together under one lock, so
// the reaper can never close a slot between an operation's check and its use.
struct Lifecycle {
    closed: bool,
    in_use: usize,
    last_used: Instant,
}

/// Registry entry shared between the multiplexer (writer side) and one
/// conversation handle (reader side).
pub struct ConversationSlot {
    inbox: Inbox,
    exception_signaled: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
}

impl Default for ConversationSlot {
    fn default() -> Self {
        Self {
            inbox: Inbox::new(),
            exception_signaled: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle {
                closed: false,
                in_use: 0,
                last_used: Instant::now(),
            }),
        }
    }
}

impl ConversationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push an exception envelope and raise the sticky flag if it was accepted.
    fn push_exception(&self, env: Envelope) {
        if self.inbox.push(env) {
            self.exception_signaled.store(true, Ordering::Release);
        }
    }

    /// Read and clear the sticky exception flag.
    pub fn take_exception_signal(&self) -> bool {
        self.exception_signaled.swap(false, Ordering::AcqRel)
    }

    pub fn clear_exception_signal(&self) {
        self.exception_signaled.store(false, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle().closed
    }

    /// Returns `true` if this call performed the transition to closed.
    pub fn mark_closed(&self) -> bool {
        let mut lc = self.lifecycle();
        !std::mem::replace(&mut lc.closed, true)
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.lifecycle().last_used)
    }

    /// Pin the slot open for one operation. `None` if it is already closed.
    ///
    /// While the guard lives the reaper leaves the slot alone.
    pub fn begin_use(&self) -> Option<UseGuard<'_>> {
        let mut lc = self.lifecycle();
        if lc.closed {
            return None;
        }
        lc.in_use += 1;
        lc.last_used = Instant::now();
        Some(UseGuard { slot: self })
    }

    fn is_reapable(&self, now: Instant, grace: Duration) -> bool {
        let lc = self.lifecycle();
        !lc.closed && lc.in_use == 0 && now.saturating_duration_since(lc.last_used) > grace
    }

    /// Close the slot if it is reapable, deciding and closing in one step.
    fn try_reap(&self, now: Instant, grace: Duration) -> bool {
        let mut lc = self.lifecycle();
        if lc.closed || lc.in_use > 0 || now.saturating_duration_since(lc.last_used) <= grace {
            return false;
        }
        lc.closed = true;
        true
    }
}

/// Keeps a slot open and out of the reaper's reach for one operation.
pub struct UseGuard<'a> {
    slot: &'a ConversationSlot,
}

impl Drop for UseGuard<'_> {
    fn drop(&mut self) {
        let mut lc = self.slot.lifecycle();
        lc.in_use -= 1;
        lc.last_used = Instant::now();
    }
}

#[derive(Default)]
pub struct ConversationMultiplexer {
    conversations: DashMap<String, Arc<ConversationSlot>>,
}

impl ConversationMultiplexer {
    pub fn new() -> Self {
        Self {
            conversations: DashMap::new(),
        }
    }

    /// Register a conversation. Registering a live id twice is a caller bug.
    pub fn add_conversation(&self, conversation_id: String, slot: Arc<ConversationSlot>) -> Result<()> {
        match self.conversations.entry(conversation_id) {
            Entry::Occupied(o) => {
                tracing::warn!(conversation = %o.key(), "conversation id already registered");
                Err(ParleyError::DuplicateConversation(o.key().clone()))
            }
            Entry::Vacant(v) => {
                tracing::debug!(conversation = %v.key(), "conversation registered");
                v.insert(slot);
                Ok(())
            }
        }
    }

    /// Unregister. Returns whether an entry existed.
    pub fn remove_conversation(&self, conversation_id: &str) -> bool {
        self.conversations.remove(conversation_id).is_some()
    }

    /// Unregister only if `slot` is still the registered entry for this id.
    pub(crate) fn remove_slot(&self, conversation_id: &str, slot: &Arc<ConversationSlot>) -> bool {
        self.conversations
            .remove_if(conversation_id, |_, v| Arc::ptr_eq(v, slot))
            .is_some()
    }

    pub fn has_conversation(&self, conversation_id: &str) -> bool {
        self.conversations.contains_key(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Transport-facing entry point: route one inbound envelope.
    pub fn deliver(&self, env: Envelope) -> Result<()> {
        // Clone the Arc out so the shard lock is released before pushing.
        let slot = self
            .conversations
            .get(env.conversation_id())
            .map(|r| Arc::clone(r.value()));

        let Some(slot) = slot else {
            tracing::error!(
                conversation = %env.conversation_id(),
                seq = env.seq(),
                exception = env.is_exception(),
                "envelope for unknown conversation"
            );
            return Err(ParleyError::UnknownConversation(env.conversation_id().to_string()));
        };

        if env.is_exception() {
            slot.push_exception(env);
        } else {
            slot.inbox().push(env);
        }
        Ok(())
    }

    /// Close every conversation idle for longer than `grace` and not pinned by
    /// an operation. Returns the ids that were closed.
    pub fn reap_idle(&self, grace: Duration) -> Vec<String> {
        let now = Instant::now();
        let candidates: Vec<String> = self
            .conversations
            .iter()
            .filter(|e| e.value().is_reapable(now, grace))
            .map(|e| e.key().clone())
            .collect();

        let mut reaped = Vec::with_capacity(candidates.len());
        for id in candidates {
            // Decide and close under the slot lock: the handle may have pinned it meanwhile.
            let Some((id, slot)) = self
                .conversations
                .remove_if(&id, |_, slot| slot.try_reap(now, grace))
            else {
                continue;
            };
            tracing::warn!(
                conversation = %id,
                idle_ms = slot.idle_for(now).as_millis() as u64,
                "closing idle conversation"
            );
            reaped.push(id);
        }
        reaped
    }
}

impl MessageTransport for ConversationMultiplexer {
    fn send(&self, envelope: Envelope) -> Result<()> {
        self.deliver(envelope)
    }
}
