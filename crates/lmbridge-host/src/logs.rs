//! Bounded operational log ring.
//!
//! Appends come from any component through the `LogSink` port; observers
//! read snapshots or subscribe to the broadcast feed. Capacity is capped
//! with FIFO eviction; insertion order per writer is the only ordering
//! guarantee.

use std::collections::VecDeque;
use std::sync::RwLock;

use tokio::sync::broadcast;

use lmbridge_core::ports::LogSink;
use lmbridge_core::status::ServerLog;

/// Maximum number of entries kept in the ring.
pub const LOG_CAPACITY: usize = 500;

/// Broadcast channel capacity for live log subscribers.
const BROADCAST_CAPACITY: usize = 256;

/// Capped, oldest-evicted append log of operational events.
#[derive(Debug)]
pub struct LogRing {
    entries: RwLock<VecDeque<ServerLog>>,
    tx: broadcast::Sender<ServerLog>,
}

impl LogRing {
    /// Create an empty ring.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(LOG_CAPACITY)),
            tx,
        }
    }

    /// Append an entry, evicting the oldest at capacity, and fan it out to
    /// subscribers (ignored when nobody listens).
    pub fn push(&self, entry: ServerLog) {
        {
            let mut entries = self.entries.write().unwrap();
            if entries.len() >= LOG_CAPACITY {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        let _ = self.tx.send(entry);
    }

    /// Snapshot of all retained entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ServerLog> {
        self.entries.read().unwrap().iter().cloned().collect()
    }

    /// Subscribe to entries appended after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerLog> {
        self.tx.subscribe()
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for LogRing {
    fn append(&self, entry: ServerLog) {
        self.push(entry);
    }
}
