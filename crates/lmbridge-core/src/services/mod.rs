//! Core services - orchestration between ports and domain logic.
//!
//! Services here are pure orchestrators; they know the port traits but no
//! concrete implementations.

mod bridge;

pub use bridge::{BridgeError, COMPLETION_TIMEOUT, complete};
