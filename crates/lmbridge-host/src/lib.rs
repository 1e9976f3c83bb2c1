//! Host supervisor for the lmbridge server.
//!
//! Owns listener startup (with sequential port retry on bind conflicts),
//! live status (uptime, request count, busy flag, bound address), graceful
//! shutdown, and the bounded operational-log ring that status observers
//! read.

pub mod logs;
pub mod retry;
pub mod supervisor;

pub use logs::{LOG_CAPACITY, LogRing};
pub use retry::RetryPolicy;
pub use supervisor::{PORT_ATTEMPTS, PORT_RETRY_DELAY, ServerSupervisor, SupervisorError};
