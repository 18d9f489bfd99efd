//! # RWCEC-DVFS — Speed-Update Engine
//!
//! Runtime Dynamic Voltage and Frequency Scaling for ARM Cortex-M4
//! firmware, driven by static worst-case execution cycle (WCEC) analysis.
//!
//! ## Overview
//!
//! An offline analysis annotates the program's control-flow graph with
//! remaining worst-case cycle counts (RWCEC) and instruments two kinds of
//! edges:
//!
//! - **Type-B** (branch): the taken successor has less remaining worst-case
//!   work than the worst successor the deadline was computed for
//! - **Type-L** (loop exit): the loop ran fewer iterations than its bound
//!
//! In both cases the difference is slack. At the edge, the engine computes
//! the speed-update ratio (SUR), the fraction of the current speed that
//! still meets the original worst-case deadline, and lowers the core clock
//! accordingly. It never raises it.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              Instrumented Application Code              │
//! │     PendingDecision::branch() · LoopSite::exit()        │
//! ├────────────────────────────────────────────────────────┤
//! │             Speed-Update Engine (engine.rs)             │
//! │     apply_decision() · apply_shared() · EngineStats     │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Edge Model  │  Ratio Calculators │  Shared Slot      │
//! │  edge.rs     │  ratio.rs          │  sync.rs          │
//! │  ─ EdgeKind  │  ─ survival_ratio_b│  ─ SharedDecision │
//! │  ─ LoopSite  │  ─ survival_ratio_l│  ─ critical_section│
//! │  ─ LoopCounter│ ─ ceil_to_int     │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │         Frequency Capability (freq.rs)                  │
//! │    FrequencyControl · FixedFrequency                    │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │    SysTickClock · SysTick retiming                      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use rwcec_dvfs::edge::PendingDecision;
//! use rwcec_dvfs::engine::{Outcome, SpeedUpdateEngine};
//! use rwcec_dvfs::freq::FixedFrequency;
//!
//! let mut engine = SpeedUpdateEngine::new(FixedFrequency);
//! let mut decision = PendingDecision::branch(551.0, 540.0);
//!
//! // 540 / 551 of 100 steps, rounded up
//! assert_eq!(engine.apply_decision(&mut decision), Outcome::Scaled(99));
//! assert!(!decision.is_pending());
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: pure `core`, no `alloc`
//! - **No float library**: ratios use plain `f32` arithmetic, rounding is
//!   done by `ratio::ceil_to_int`
//! - **Single pending decision**: passed by value to the engine, or held in
//!   a `SharedDecision` behind a critical section

#![no_std]

pub mod config;
pub mod edge;
pub mod ratio;
pub mod freq;
pub mod engine;
pub mod arch;
pub mod sync;
