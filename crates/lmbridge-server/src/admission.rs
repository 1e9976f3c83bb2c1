//! Single-flight admission gate.
//!
//! The underlying model runtime supports exactly one concurrent generation;
//! admitting a second request would corrupt or stall the first. The gate is
//! one atomic busy flag, tested-and-set before any decoding work and
//! released by the permit's `Drop` on every exit path. There is no queue:
//! rejected callers are answered immediately and retry on their own.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// The busy flag and request counter, owned by this gate alone.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    busy: AtomicBool,
    processed: AtomicU64,
}

impl AdmissionGate {
    /// Try to admit one request.
    ///
    /// Returns a permit on success; `None` when a completion is already in
    /// flight. Admitted requests count toward `requests_processed`.
    pub fn try_acquire(&self) -> Option<AdmissionPermit<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.processed.fetch_add(1, Ordering::Relaxed);
            Some(AdmissionPermit { gate: self })
        } else {
            None
        }
    }

    /// Whether a completion is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of requests admitted since construction.
    pub fn requests_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

/// RAII admission permit; dropping it frees the gate.
#[derive(Debug)]
pub struct AdmissionPermit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_permit_held() {
        let gate = AdmissionGate::default();

        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn only_admitted_requests_are_counted() {
        let gate = AdmissionGate::default();

        let permit = gate.try_acquire();
        assert!(gate.try_acquire().is_none());
        drop(permit);

        assert_eq!(gate.requests_processed(), 1);
    }
}
