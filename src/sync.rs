//! # Synchronization Primitives
//!
//! Interrupt-safe critical sections and the shared decision slot.
//!
//! The engine's primary API threads a `PendingDecision` by value from the
//! call site to `apply_decision`. When instrumentation publishes decisions
//! from interrupt handlers, or from generated code that expects a single
//! process-wide slot, `SharedDecision` holds that slot behind a critical
//! section.

use core::cell::Cell;

pub use cortex_m::interrupt::CriticalSection;
use cortex_m::interrupt::{self, Mutex};

use crate::edge::PendingDecision;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are disabled on entry and restored on exit. Keep the closure
/// short; it adds directly to interrupt latency.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&CriticalSection) -> R,
{
    interrupt::free(f)
}

/// Single-slot pending decision shared across interrupt contexts.
///
/// Later publishes overwrite earlier ones; there is no queue.
pub struct SharedDecision {
    slot: Mutex<Cell<PendingDecision>>,
}

impl SharedDecision {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(PendingDecision::unknown())),
        }
    }

    /// Overwrite the slot with `decision`.
    pub fn publish(&self, cs: &CriticalSection, decision: PendingDecision) {
        self.slot.borrow(cs).set(decision);
    }

    /// Remove the pending decision, leaving `Unknown` behind.
    pub fn take(&self, cs: &CriticalSection) -> PendingDecision {
        self.slot.borrow(cs).replace(PendingDecision::unknown())
    }

    /// Copy of the slot without consuming it.
    pub fn peek(&self, cs: &CriticalSection) -> PendingDecision {
        self.slot.borrow(cs).get()
    }
}

impl Default for SharedDecision {
    fn default() -> Self {
        Self::new()
    }
}
