//! # Speed-Update Engine
//!
//! Consumes one pending decision, computes its speed-update ratio and,
//! when the ratio shows safe slow-down, programs the reduced frequency.
//!
//! ## Decision Cycle
//!
//! At each instrumented edge:
//! 1. **Dispatch** on `EdgeKind` to the matching ratio calculator
//! 2. **Apply**: if `ratio < 1.0`, program `ceil(current × ratio)`
//! 3. **Hold**: if `ratio >= 1.0`, leave the frequency untouched. The
//!    engine never scales up.
//! 4. **Reset**: `kind` returns to `Unknown`, whatever branch was taken
//!
//! Every call is a single synchronous attempt on the caller's thread.
//! Nothing here can fail: non-computable ratios are clamped to `1.0`
//! upstream and read as "hold".

use crate::config::OverheadConfig;
use crate::edge::{EdgeKind, PendingDecision};
use crate::freq::FrequencyControl;
use crate::ratio;
use crate::sync::{CriticalSection, SharedDecision};

/// Result of consuming one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The frequency primitive was invoked with this value.
    Scaled(u32),
    /// A ratio was computed but slow-down was not safe.
    Held,
    /// No decision was pending.
    Idle,
}

/// Running counters over every decision the engine consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Calls to `apply_decision`, idle ones included.
    pub decisions: u32,
    /// Frequency changes issued.
    pub scaled: u32,
    /// Decisions whose ratio did not allow slow-down.
    pub held: u32,
    /// Calls made with nothing pending.
    pub idle: u32,
    /// Last frequency handed to the hardware primitive.
    pub last_frequency: Option<u32>,
}

impl EngineStats {
    pub const fn new() -> Self {
        Self {
            decisions: 0,
            scaled: 0,
            held: 0,
            idle: 0,
            last_frequency: None,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.decisions = self.decisions.wrapping_add(1);
        match outcome {
            Outcome::Scaled(freq) => {
                self.scaled = self.scaled.wrapping_add(1);
                self.last_frequency = Some(freq);
            },
            Outcome::Held => self.held = self.held.wrapping_add(1),
            Outcome::Idle => self.idle = self.idle.wrapping_add(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The speed-update engine, generic over its frequency back-end.
#[derive(Debug)]
pub struct SpeedUpdateEngine<F: FrequencyControl> {
    freq: F,
    overheads: OverheadConfig,
    stats: EngineStats,
}

impl<F: FrequencyControl> SpeedUpdateEngine<F> {
    /// Engine with the compile-time default overheads.
    pub const fn new(freq: F) -> Self {
        Self::with_overheads(freq, OverheadConfig::DEFAULT)
    }

    pub const fn with_overheads(freq: F, overheads: OverheadConfig) -> Self {
        Self {
            freq,
            overheads,
            stats: EngineStats::new(),
        }
    }

    /// Consume a pending decision. The engine's single entry point.
    ///
    /// On return `decision.kind` is always `EdgeKind::Unknown`.
    pub fn apply_decision(&mut self, decision: &mut PendingDecision) -> Outcome {
        let outcome = match self.ratio_for(decision) {
            Some(ratio) => self.apply_ratio(ratio),
            None => {
                log::trace!("dvfs: no decision pending");
                Outcome::Idle
            },
        };

        decision.reset();
        self.stats.record(outcome);
        outcome
    }

    /// Take the decision out of an interrupt-shared slot and consume it.
    pub fn apply_shared(&mut self, cs: &CriticalSection, slot: &SharedDecision) -> Outcome {
        let mut decision = slot.take(cs);
        self.apply_decision(&mut decision)
    }

    /// Speed-update ratio of `decision`, or `None` when nothing is pending.
    pub fn ratio_for(&self, decision: &PendingDecision) -> Option<f32> {
        match decision.kind {
            EdgeKind::TypeB => Some(ratio::survival_ratio_b(
                decision.param_a,
                decision.param_b,
                self.overheads.type_b,
            )),
            EdgeKind::TypeL => Some(ratio::survival_ratio_l(
                decision.param_a,
                decision.param_b,
                decision.loop_max_iter,
                decision.loop_iter,
                self.overheads.type_l,
            )),
            EdgeKind::Unknown => None,
        }
    }

    /// Program `ceil(current × ratio)` when `ratio < 1.0`; hold otherwise.
    ///
    /// NaN compares false and is held. So is a target that does not fit a
    /// `u32` step or that the back-end refuses, keeping `Scaled` equal to
    /// what the hardware was actually given.
    fn apply_ratio(&mut self, ratio: f32) -> Outcome {
        if !(ratio < 1.0) {
            log::trace!("dvfs: ratio {} >= 1, holding frequency", ratio);
            return Outcome::Held;
        }

        let current = self.freq.current();
        let target = current * ratio;
        let Some(freq) = ratio::ceil_to_step(target) else {
            log::warn!("dvfs: ratio {} gives unrepresentable frequency {}, holding", ratio, target);
            return Outcome::Held;
        };
        if !self.freq.accepts(freq) {
            log::warn!("dvfs: back-end rejects frequency {}, holding", freq);
            return Outcome::Held;
        }

        log::debug!("dvfs: ratio {} scales {} -> {}", ratio, current, freq);
        self.freq.set(freq);
        Outcome::Scaled(freq)
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EngineStats::new();
    }

    pub fn overheads(&self) -> &OverheadConfig {
        &self.overheads
    }

    /// The frequency back-end.
    pub fn frequency(&self) -> &F {
        &self.freq
    }

    pub fn frequency_mut(&mut self) -> &mut F {
        &mut self.freq
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{LoopCounter, LoopSite};
    use crate::freq::{FakeFrequency, FixedFrequency};

    fn engine_at(freq: f32) -> SpeedUpdateEngine<FakeFrequency> {
        SpeedUpdateEngine::new(FakeFrequency::new(freq))
    }

    #[test]
    fn test_branch_scenario() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::branch(551.0, 540.0);

        let outcome = engine.apply_decision(&mut d);

        assert_eq!(outcome, Outcome::Scaled(99));
        assert_eq!(engine.frequency().set_calls, 1);
        assert_eq!(engine.frequency().last_set, Some(99));
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_loop_scenario() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::loop_exit(96.0, 16.0, 5, 2);

        let expected = ratio::ceil_to_int(100.0 * (16.0 / 304.0)) as u32;
        assert_eq!(expected, 6);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(expected));
        assert_eq!(engine.frequency().last_set, Some(expected));
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_fail_safe_with_overhead() {
        let overheads = OverheadConfig::new(551.0, 0.0).unwrap();
        let mut engine = SpeedUpdateEngine::with_overheads(FakeFrequency::new(100.0), overheads);
        let mut d = PendingDecision::branch(551.0, 540.0);

        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_never_scales_up() {
        let mut engine = engine_at(100.0);
        // Taken path heavier than the assumed worst successor
        let mut d = PendingDecision::branch(400.0, 500.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(d.kind, EdgeKind::Unknown);

        // Equal work: ratio exactly 1
        let mut d = PendingDecision::branch(500.0, 500.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(d.kind, EdgeKind::Unknown);

        // Loop ran to its bound
        let mut d = PendingDecision::loop_exit(96.0, 16.0, 5, 5);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(d.kind, EdgeKind::Unknown);

        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(engine.stats().held, 3);
    }

    #[test]
    fn test_every_path_resets_kind() {
        let fail_safe = OverheadConfig::new(551.0, 320.0).unwrap();
        let cases = [
            // (decision, overheads, expected)
            (PendingDecision::branch(551.0, 540.0), OverheadConfig::DEFAULT, Outcome::Scaled(99)),
            (PendingDecision::loop_exit(96.0, 16.0, 5, 2), OverheadConfig::DEFAULT, Outcome::Scaled(6)),
            (PendingDecision::branch(500.0, 500.0), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::loop_exit(96.0, 16.0, 5, 5), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::branch(551.0, 540.0), fail_safe, Outcome::Held),
            (PendingDecision::loop_exit(96.0, 16.0, 5, 2), fail_safe, Outcome::Held),
            (PendingDecision::branch(100.0, -50.0), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::loop_exit(96.0, -16.0, 5, 2), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::branch(100.0, f32::NAN), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::loop_exit(f32::NAN, 16.0, 5, 2), OverheadConfig::DEFAULT, Outcome::Held),
            (PendingDecision::unknown(), OverheadConfig::DEFAULT, Outcome::Idle),
        ];

        for (decision, overheads, expected) in cases {
            let mut engine = SpeedUpdateEngine::with_overheads(FakeFrequency::new(100.0), overheads);
            let mut d = decision;
            assert_eq!(engine.apply_decision(&mut d), expected, "{:?}", decision);
            assert_eq!(d.kind, EdgeKind::Unknown, "{:?}", decision);
        }
    }

    #[test]
    fn test_huge_target_is_held() {
        let mut engine = engine_at(f32::MAX);
        let mut d = PendingDecision::branch(551.0, 540.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_target_above_i32_range_is_issued() {
        let mut engine = engine_at(4_000_000_000.0);
        let mut d = PendingDecision::branch(100.0, 50.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(2_000_000_000));

        let mut d = PendingDecision::branch(100.0, 90.0);
        let expected = ratio::ceil_to_step(4_000_000_000.0 * (90.0 / 100.0)).unwrap();
        assert!(expected > i32::MAX as u32);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(expected));
    }

    #[test]
    fn test_rejected_target_is_held_and_not_counted() {
        let mut fake = FakeFrequency::new(100.0);
        fake.floor = 10;
        let mut engine = SpeedUpdateEngine::new(fake);

        // 100 × 0 = 0 steps, below the back-end floor
        let mut d = PendingDecision::branch(100.0, 0.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(engine.stats().scaled, 0);
        assert_eq!(engine.stats().last_frequency, None);
        assert_eq!(d.kind, EdgeKind::Unknown);

        let mut d = PendingDecision::branch(551.0, 540.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(99));
        assert_eq!(engine.stats().last_frequency, Some(99));
    }

    #[test]
    fn test_unknown_is_noop() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::unknown();
        d.param_a = 551.0;
        d.param_b = 1.0;

        assert_eq!(engine.apply_decision(&mut d), Outcome::Idle);
        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_stale_decision_not_reapplied() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::branch(551.0, 540.0);

        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(99));
        assert_eq!(engine.apply_decision(&mut d), Outcome::Idle);
        assert_eq!(engine.frequency().set_calls, 1);
    }

    #[test]
    fn test_frequency_matches_ceil_of_scaled_current() {
        for &(current, worst, bj) in &[(100.0, 524.0, 507.0), (168.0, 428.0, 408.0), (16.0, 300.0, 150.0)] {
            let mut engine = engine_at(current);
            let mut d = PendingDecision::branch(worst, bj);
            let ratio = engine.ratio_for(&d).unwrap();
            let expected = ratio::ceil_to_int(current * ratio) as u32;

            assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(expected));
            assert_eq!(engine.frequency().last_set, Some(expected));
        }
    }

    #[test]
    fn test_zero_remaining_work_scales_to_zero() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::branch(100.0, 0.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(0));
    }

    #[test]
    fn test_negative_target_is_held() {
        let mut engine = engine_at(100.0);
        // Negative RWCEC breaks the instrumentation precondition
        let mut d = PendingDecision::branch(100.0, -50.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(engine.frequency().set_calls, 0);
        assert_eq!(d.kind, EdgeKind::Unknown);
    }

    #[test]
    fn test_nan_ratio_is_held() {
        let mut engine = engine_at(100.0);
        let mut d = PendingDecision::branch(100.0, f32::NAN);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Held);
        assert_eq!(engine.frequency().set_calls, 0);
    }

    #[test]
    fn test_stats_accumulate_and_reset() {
        let mut engine = engine_at(100.0);
        engine.apply_decision(&mut PendingDecision::branch(551.0, 540.0));
        engine.apply_decision(&mut PendingDecision::branch(500.0, 500.0));
        engine.apply_decision(&mut PendingDecision::unknown());

        let stats = *engine.stats();
        assert_eq!(stats.decisions, 3);
        assert_eq!(stats.scaled, 1);
        assert_eq!(stats.held, 1);
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.last_frequency, Some(99));

        engine.reset_stats();
        assert_eq!(*engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_default_source_scenario() {
        let mut engine = SpeedUpdateEngine::new(FixedFrequency);
        let mut d = PendingDecision::branch(551.0, 540.0);
        assert_eq!(engine.apply_decision(&mut d), Outcome::Scaled(99));
    }

    #[test]
    fn test_apply_shared_consumes_slot() {
        let slot = SharedDecision::new();
        // Host tests run without interrupts; minting the token is sound here
        let cs = unsafe { CriticalSection::new() };
        slot.publish(&cs, PendingDecision::branch(551.0, 540.0));

        let mut engine = engine_at(100.0);
        assert_eq!(engine.apply_shared(&cs, &slot), Outcome::Scaled(99));
        assert!(!slot.peek(&cs).is_pending());
        assert_eq!(engine.apply_shared(&cs, &slot), Outcome::Idle);
    }

    #[test]
    fn test_shared_loop_exit_unaffected_by_direct_branch() {
        let slot = SharedDecision::new();
        let cs = unsafe { CriticalSection::new() };
        let site = LoopSite::from_body_rwcec(480.0, 5, 16.0);
        let mut iterations = LoopCounter::new();
        iterations.tick();
        iterations.tick();

        slot.publish(&cs, site.exit(&iterations));

        let mut engine = engine_at(100.0);
        // Branch decisions inside the loop are passed by value, not via the slot
        assert_eq!(engine.apply_decision(&mut PendingDecision::branch(428.0, 408.0)), Outcome::Scaled(96));
        assert_eq!(engine.apply_shared(&cs, &slot), Outcome::Scaled(6));
        assert!(!slot.peek(&cs).is_pending());
    }
}
