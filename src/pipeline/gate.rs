//! Single-slot frame admission
//!
//! At most one recognition cycle runs at a time. Frames offered while a cycle
//! is in flight are dropped, not queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Admission gate shared between the frame producer and the worker
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl FrameGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the slot. Returns `None` while another cycle holds it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        match self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                Some(GatePermit { gate: Arc::clone(self) })
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Frame counters since the gate was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateStats {
    pub accepted: u64,
    pub dropped: u64,
}

/// Proof of holding the slot; the gate returns to idle when it is dropped
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<FrameGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
