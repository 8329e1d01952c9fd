//! Conversation machinery.
//!
//! Inbox, multiplexer, handle and the idle reaper.

mod handle;
mod inbox;
mod multiplexer;
mod reaper;

pub use handle::Conversation;
pub use inbox::Inbox;
pub use multiplexer::{ConversationMultiplexer, ConversationSlot, UseGuard};
pub use reaper::IdleReaper;
