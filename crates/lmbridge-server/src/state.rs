//! Shared application state.
//!
//! One `ServerContext` per listener, shared across handlers. The runtime
//! slot decouples model attachment from bind success: the listener can be
//! up before an engine is attached, and requests in that window answer
//! `model_not_initialized`.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use lmbridge_core::ports::{InferenceRuntime, LogSink};
use lmbridge_media::DecodeLimits;

/// Application state shared across all handlers.
pub type SharedState = Arc<ServerContext>;

/// Holder for the attachable inference runtime.
///
/// Cloning shares the slot; the supervisor attaches and detaches, handlers
/// only read.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSlot {
    inner: Arc<RwLock<Option<Arc<dyn InferenceRuntime>>>>,
}

impl RuntimeSlot {
    /// Attach an engine, replacing any previous one.
    pub fn attach(&self, runtime: Arc<dyn InferenceRuntime>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(runtime);
        }
    }

    /// Detach the current engine, if any.
    pub fn detach(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    /// The currently attached engine.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn InferenceRuntime>> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }

    /// Whether an engine is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.read().is_ok_and(|slot| slot.is_some())
    }
}

/// State behind the router: configuration, gate, runtime slot, log sink.
pub struct ServerContext {
    /// The single model name this server advertises and accepts.
    pub model_name: String,
    /// Attachable inference runtime.
    pub runtime: RuntimeSlot,
    /// Single-flight gate; owns the busy flag and the request counter.
    pub admission: crate::admission::AdmissionGate,
    /// Operational log sink (ring buffer in production, noop in tests).
    pub log: Arc<dyn LogSink>,
    /// Media decode limits.
    pub limits: DecodeLimits,
    /// When this context came up; drives `uptime_seconds`.
    pub started_at: Instant,
    /// Unix timestamp of startup, reported as the model's `created` field.
    pub created: i64,
}

impl ServerContext {
    /// Build shared state for one listener.
    #[must_use]
    pub fn new(model_name: impl Into<String>, runtime: RuntimeSlot, log: Arc<dyn LogSink>) -> SharedState {
        Arc::new(Self {
            model_name: model_name.into(),
            runtime,
            admission: crate::admission::AdmissionGate::default(),
            log,
            limits: DecodeLimits::default(),
            started_at: Instant::now(),
            created: chrono::Utc::now().timestamp(),
        })
    }

    /// Whole seconds since this context came up.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("model_name", &self.model_name)
            .field("busy", &self.admission.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmbridge_core::ports::{EchoRuntime, NoopLogSink};

    #[test]
    fn runtime_slot_attach_detach() {
        let slot = RuntimeSlot::default();
        assert!(!slot.is_attached());
        assert!(slot.current().is_none());

        slot.attach(Arc::new(EchoRuntime));
        assert!(slot.is_attached());
        assert!(slot.current().is_some());

        slot.detach();
        assert!(!slot.is_attached());
    }

    #[test]
    fn cloned_slots_share_attachment() {
        let slot = RuntimeSlot::default();
        let clone = slot.clone();
        slot.attach(Arc::new(EchoRuntime));
        assert!(clone.is_attached());
    }

    #[test]
    fn context_starts_idle() {
        let context = ServerContext::new("m", RuntimeSlot::default(), Arc::new(NoopLogSink));
        assert!(!context.admission.is_busy());
        assert_eq!(context.admission.requests_processed(), 0);
    }
}
