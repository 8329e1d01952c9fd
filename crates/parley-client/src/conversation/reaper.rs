//! Idle conversation reaper.
//!
//! Periodically closes conversations that have not been used for longer than
//! the grace period. Driven by a tokio interval, never by drop order.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::conversation::multiplexer::ConversationMultiplexer;

pub struct IdleReaper {
    task: JoinHandle<()>,
}

impl IdleReaper {
    /// Start sweeping `multiplexer` every `sweep_every`. Must be called from
    /// within a tokio runtime. The task ends on its own once the multiplexer
    /// is dropped.
    pub fn spawn(
        multiplexer: &Arc<ConversationMultiplexer>,
        grace: Duration,
        sweep_every: Duration,
    ) -> Self {
        let weak: Weak<ConversationMultiplexer> = Arc::downgrade(multiplexer);
        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(sweep_every);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let Some(mux) = weak.upgrade() else { break };
                let reaped = mux.reap_idle(grace);
                if !reaped.is_empty() {
                    tracing::debug!(count = reaped.len(), "idle sweep closed conversations");
                }
            }
        });
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop sweeping.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for IdleReaper {
    fn drop(&mut self) {
        self.task.abort();
    }
}
