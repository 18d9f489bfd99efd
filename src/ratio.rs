//! # Speed-Update Ratio Calculators
//!
//! One calculator per edge kind. Each returns the speed-update ratio
//! (SUR): the fraction of the current speed that still finishes the
//! remaining worst-case work exactly by the original deadline.
//!
//! ## Formulas
//!
//! ```text
//! type-B:  r(bi, bj)   = RWCEC(bj) / (RWCEC(worst_succ(bi)) - overhead_B)
//! type-L:  r(bi, bout) = RWCEC(bout) / (RWCEC(bout) + saved(bi) - overhead_L)
//!          saved(bi)   = WCEC(iter) × (max_iter - iter)
//! ```
//!
//! A non-positive denominator yields `1.0`, which the engine reads as
//! "do not scale". All arithmetic is plain `f32`; nothing here needs a
//! float math library.

/// Round `x` up to the nearest integer without `libm`.
///
/// Integral values are returned unchanged. Values beyond the `i32` range
/// saturate.
#[inline]
pub fn ceil_to_int(x: f32) -> i32 {
    let truncated = x as i32;
    if x > truncated as f32 {
        truncated.saturating_add(1)
    } else {
        truncated
    }
}

/// Round `x` up to an unsigned frequency step.
///
/// `None` for negative or NaN inputs and for values past `u32::MAX`.
#[inline]
pub fn ceil_to_step(x: f32) -> Option<u32> {
    // u32::MAX is not representable; 2^32 is the first float past it
    if !(x >= 0.0) || x >= 4_294_967_296.0 {
        return None;
    }
    let truncated = x as u32;
    if x > truncated as f32 {
        truncated.checked_add(1)
    } else {
        Some(truncated)
    }
}

/// Speed-update ratio for a type-B (branch) edge.
pub fn survival_ratio_b(rwcec_worst_succ: f32, rwcec_bj: f32, overhead: f32) -> f32 {
    let budget = rwcec_worst_succ - overhead;
    if budget <= 0.0 {
        return 1.0;
    }
    rwcec_bj / budget
}

/// Cycles left unexecuted because the loop exited early.
///
/// Non-negative whenever `loop_iter <= loop_max_iter`; the instrumentation
/// upholds that, it is not checked here.
#[inline]
pub fn cycles_saved(loop_wcec_per_iter: f32, loop_max_iter: i32, loop_iter: i32) -> f32 {
    loop_wcec_per_iter * loop_max_iter.saturating_sub(loop_iter) as f32
}

/// Speed-update ratio for a type-L (loop-exit) edge.
pub fn survival_ratio_l(
    loop_wcec_per_iter: f32,
    rwcec_bout: f32,
    loop_max_iter: i32,
    loop_iter: i32,
    overhead: f32,
) -> f32 {
    let saved = cycles_saved(loop_wcec_per_iter, loop_max_iter, loop_iter);
    let budget = rwcec_bout + saved - overhead;
    if budget <= 0.0 {
        return 1.0;
    }
    rwcec_bout / budget
}
