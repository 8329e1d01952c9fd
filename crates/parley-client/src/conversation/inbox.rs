//! Per-conversation inbox: ordered, deduplicating, blocking mailbox.
//!
//! Dedup rule: any envelope whose `seq` is not above the highest `seq` already
//! accepted is dropped. This makes transport redelivery harmless, but it is not
//! a reorder buffer: after `2` has been seen, a late `0` or `1` is dropped too.
//!
//! An exception envelope discards everything still buffered before it is
//! enqueued, so a waiting reader sees the error instead of stale payload.
//!
//! Single-reader contract: one consumer at a time. `push` never blocks on the
//! consumer and is safe to call from any dispatch thread.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

use parley_core::Envelope;

#[derive(Default)]
struct InboxState {
    queue: VecDeque<Envelope>,
    highest_seq: Option<u64>,
}

#[derive(Default)]
pub struct Inbox {
    state: Mutex<InboxState>,
    available: Notify,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never panic, so a poisoned lock still holds consistent state.
    fn state(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffer an inbound envelope. Returns `false` if it was dropped as stale.
    pub fn push(&self, env: Envelope) -> bool {
        {
            let mut st = self.state();
            if st.highest_seq.is_some_and(|h| env.seq() <= h) {
                tracing::trace!(
                    conversation = %env.conversation_id(),
                    seq = env.seq(),
                    "dropping stale or duplicate envelope"
                );
                return false;
            }
            st.highest_seq = Some(env.seq());
            if env.is_exception() {
                st.queue.clear();
            }
            st.queue.push_back(env);
        }
        self.available.notify_one();
        true
    }

    /// Non-blocking take.
    pub fn try_poll(&self) -> Option<Envelope> {
        self.state().queue.pop_front()
    }

    /// Take the head envelope only if it is an exception.
    pub fn take_exception(&self) -> Option<Envelope> {
        let mut st = self.state();
        if st.queue.front().is_some_and(Envelope::is_exception) {
            st.queue.pop_front()
        } else {
            None
        }
    }

    /// Wait up to `timeout` for an envelope. `None` means the wait timed out.
    pub async fn poll(&self, timeout: Duration) -> Option<Envelope> {
        self.poll_until(Instant::now() + timeout).await
    }

    /// Wait until `deadline` for an envelope.
    pub async fn poll_until(&self, deadline: Instant) -> Option<Envelope> {
        loop {
            if let Some(env) = self.try_poll() {
                return Some(env);
            }
            // notify_one stores a permit when nobody waits, so a push racing
            // with the check above still wakes us.
            if timeout_at(deadline, self.available.notified()).await.is_err() {
                return self.try_poll();
            }
        }
    }

    /// Number of buffered envelopes.
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest sequence accepted so far.
    pub fn highest_seq(&self) -> Option<u64> {
        self.state().highest_seq
    }
}
