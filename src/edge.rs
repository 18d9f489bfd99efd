//! # Edge Model
//!
//! Defines the pending decision handed from an instrumented program point
//! to the speed-update engine, and the helpers instrumentation uses to
//! build one.
//!
//! ## Decision Lifecycle
//!
//! ```text
//!   ┌──────────┐   branch() / loop_exit()   ┌────────────────┐
//!   │ Unknown  │ ─────────────────────────► │ TypeB / TypeL  │
//!   └──────────┘                            └────────────────┘
//!        ▲                                          │
//!        │            apply_decision()              │
//!        └──────────────────────────────────────────┘
//! ```
//!
//! A decision is meaningful only between being populated and being
//! consumed. The engine resets `kind` to `Unknown` on every consumption so
//! a stale decision is never reapplied.

/// Classification of the edge that produced a pending decision.
///
/// The discriminants match the values emitted by the instrumentation
/// generator, so a decision can be shared with generated C call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EdgeKind {
    /// No decision pending. Initial and reset value; never acted upon.
    #[default]
    Unknown = 0,
    /// Branch edge: the taken successor has less remaining worst-case work
    /// than the worst successor assumed by the static analysis.
    TypeB = 1,
    /// Loop-exit edge: the loop ran fewer iterations than its static bound.
    TypeL = 2,
}

/// The single outstanding decision context.
///
/// Field meaning depends on `kind`:
///
/// | Field | TypeB | TypeL |
/// |-------|-------|-------|
/// | `param_a` | RWCEC of the worst successor | WCEC of one loop iteration |
/// | `param_b` | RWCEC of the taken successor | RWCEC of the first node after the loop |
/// | `loop_max_iter` | 0 | static iteration bound |
/// | `loop_iter` | 0 | iterations executed at runtime |
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PendingDecision {
    pub kind: EdgeKind,
    pub param_a: f32,
    pub param_b: f32,
    pub loop_max_iter: i32,
    pub loop_iter: i32,
}

impl PendingDecision {
    /// A decision with nothing pending.
    pub const fn unknown() -> Self {
        Self {
            kind: EdgeKind::Unknown,
            param_a: 0.0,
            param_b: 0.0,
            loop_max_iter: 0,
            loop_iter: 0,
        }
    }

    /// Type-B call shape, issued at the start of the taken successor.
    pub const fn branch(rwcec_worst_succ: f32, rwcec_bj: f32) -> Self {
        Self {
            kind: EdgeKind::TypeB,
            param_a: rwcec_worst_succ,
            param_b: rwcec_bj,
            loop_max_iter: 0,
            loop_iter: 0,
        }
    }

    /// Type-L call shape, issued at the first node after the loop.
    pub const fn loop_exit(wcec_per_iter: f32, rwcec_bout: f32, max_iter: i32, iter: i32) -> Self {
        Self {
            kind: EdgeKind::TypeL,
            param_a: wcec_per_iter,
            param_b: rwcec_bout,
            loop_max_iter: max_iter,
            loop_iter: iter,
        }
    }

    /// Whether a decision is waiting to be consumed.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.kind != EdgeKind::Unknown
    }

    /// Mark the decision consumed.
    #[inline]
    pub fn reset(&mut self) {
        self.kind = EdgeKind::Unknown;
    }
}

/// An edge is type-B only when the taken successor's RWCEC is strictly
/// below the worst successor's; otherwise no slack exists to reclaim.
#[inline]
pub fn is_type_b_edge(rwcec_worst_succ: f32, rwcec_bj: f32) -> bool {
    rwcec_bj < rwcec_worst_succ
}

// ---------------------------------------------------------------------------
// Loop instrumentation
// ---------------------------------------------------------------------------

/// Static annotation of a bounded loop, fixed before the loop starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSite {
    /// Worst-case cycles of a single iteration.
    pub wcec_per_iter: f32,
    /// Remaining worst-case cycles from the first node after the loop.
    pub rwcec_bout: f32,
    /// Statically assumed maximum iteration count.
    pub max_iter: i32,
}

impl LoopSite {
    pub const fn new(wcec_per_iter: f32, rwcec_bout: f32, max_iter: i32) -> Self {
        Self {
            wcec_per_iter,
            rwcec_bout,
            max_iter,
        }
    }

    /// Derive the per-iteration WCEC from the RWCEC of the whole loop body.
    ///
    /// The body figure covers all `max_iter` iterations; an unbounded
    /// (zero) count leaves it as a single iteration.
    pub fn from_body_rwcec(body_rwcec: f32, max_iter: i32, rwcec_bout: f32) -> Self {
        let wcec_per_iter = if max_iter != 0 {
            body_rwcec / max_iter as f32
        } else {
            body_rwcec
        };
        Self::new(wcec_per_iter, rwcec_bout, max_iter)
    }

    /// Build the type-L decision once the loop has finished.
    pub fn exit(&self, counter: &LoopCounter) -> PendingDecision {
        PendingDecision::loop_exit(
            self.wcec_per_iter,
            self.rwcec_bout,
            self.max_iter,
            counter.count(),
        )
    }
}

/// Runtime iteration counter for one loop.
///
/// Each loop gets its own counter; nested loops use independent ones.
/// Counters live at the call site, never in the shared decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopCounter {
    iterations: i32,
}

impl LoopCounter {
    pub const fn new() -> Self {
        Self { iterations: 0 }
    }

    /// Record one executed iteration. Call at the top of the loop body.
    #[inline]
    pub fn tick(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    #[inline]
    pub fn count(&self) -> i32 {
        self.iterations
    }
}
