//! Top-level facade crate for parley.
//!
//! Re-exports core types and the client library so users can depend on a single crate.

pub mod core {
    pub use parley_core::*;
}

pub mod client {
    pub use parley_client::*;
}
