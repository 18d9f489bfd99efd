//! # Speed-Update Demo Firmware
//!
//! Runs an instrumented workload on a Cortex-M4 and lets the engine lower
//! the core clock whenever the executed path is cheaper than its static
//! worst case.
//!
//! | Edge | Kind | Annotation (cycles) | Effect |
//! |------|------|---------------------|--------|
//! | outer `else` | TypeB | worst succ 551, taken 540 | small slow-down |
//! | inner `else` | TypeB | worst succ 524, taken 507 | small slow-down |
//! | scan loop exit | TypeL | body 480 (96/iter), 16 after, bound 5 | large slow-down on early exit |
//! | in-loop `else` | TypeB | worst succ 428, taken 408 | small slow-down |
//!
//! The annotations are what the offline WCEC analysis emits for this
//! workload; the call sites below are what its instrumentation inserts.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;

use rwcec_dvfs::arch::cortex_m4::SysTickClock;
use rwcec_dvfs::config::{FREQUENCY_UNIT_HZ, SYSTEM_CLOCK_HZ};
use rwcec_dvfs::edge::{is_type_b_edge, LoopCounter, LoopSite, PendingDecision};
use rwcec_dvfs::engine::SpeedUpdateEngine;
use rwcec_dvfs::freq::FrequencyControl;
use rwcec_dvfs::sync::{self, SharedDecision};

/// Maximum samples scanned per period, as bounded by the analysis.
const SCAN_BOUND: usize = 5;

/// Clock every period starts at; the WCEC deadline is computed against it.
const NOMINAL_STEPS: u32 = SYSTEM_CLOCK_HZ / FREQUENCY_UNIT_HZ;

/// RWCEC of the whole scan loop body over all `SCAN_BOUND` iterations.
const SCAN_BODY_RWCEC: f32 = 480.0;

/// Loop-exit decisions go through the shared slot, the way generated code
/// publishes them.
static LOOP_EXIT: SharedDecision = SharedDecision::new();

/// Board clock hook. Reprogramming the PLL is board specific; this demo
/// keeps the reset clock tree and only retimes SysTick.
fn apply_core_clock(_steps: u32) {}

/// Instrumented branch site: only edges with slack carry a decision.
fn branch_edge<F: FrequencyControl>(engine: &mut SpeedUpdateEngine<F>, worst_succ: f32, taken: f32) {
    if is_type_b_edge(worst_succ, taken) {
        engine.apply_decision(&mut PendingDecision::branch(worst_succ, taken));
    }
}

/// One period of the instrumented workload.
fn workload<F: FrequencyControl>(engine: &mut SpeedUpdateEngine<F>, samples: &[i32]) -> i32 {
    let mut a = samples.first().copied().unwrap_or(0);
    let b = 3;

    if a < b {
        a += 2 * b;
        a += 2 * b;
        a *= 5;
    } else {
        branch_edge(engine, 551.0, 540.0);

        if a > b {
            a += 1;
            a *= 5;
        } else {
            branch_edge(engine, 524.0, 507.0);
            a -= 1;
        }
    }

    let site = LoopSite::from_body_rwcec(SCAN_BODY_RWCEC, SCAN_BOUND as i32, 16.0);
    let mut iterations = LoopCounter::new();

    for &sample in samples.iter().take(SCAN_BOUND) {
        iterations.tick();

        if sample < 0 {
            break;
        }
        if sample < b {
            a = a.wrapping_add(2 * b).wrapping_mul(5);
        } else {
            branch_edge(engine, 428.0, 408.0);
            a = a.wrapping_add(2 * b);
        }
    }

    sync::critical_section(|cs| LOOP_EXIT.publish(cs, site.exit(&iterations)));
    sync::critical_section(|cs| engine.apply_shared(cs, &LOOP_EXIT));

    a
}

#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();

    let clock = SysTickClock::new(cp.SYST, apply_core_clock);
    let mut engine = SpeedUpdateEngine::new(clock);

    // Sample bursts; a negative reading ends the scan early
    let bursts: [[i32; SCAN_BOUND]; 3] = [
        [2, 7, 1, 9, 4],
        [5, 8, -1, 0, 0],
        [3, -1, 0, 0, 0],
    ];

    let mut period = 0usize;
    loop {
        engine.frequency_mut().set(NOMINAL_STEPS);
        core::hint::black_box(workload(&mut engine, &bursts[period % bursts.len()]));
        period = period.wrapping_add(1);
        cortex_m::asm::wfi();
    }
}
