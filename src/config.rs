//! # Engine Configuration
//!
//! Compile-time constants governing the speed-update engine and the
//! Cortex-M4 clock back-end, plus the overhead record the engine is
//! built with. Overheads are engine-wide, not per-edge.

use core::fmt;

/// Frequency reported by the default frequency source when no hardware
/// reader is wired in. Expressed in frequency steps (see `FREQUENCY_UNIT_HZ`).
pub const DEFAULT_FREQUENCY: f32 = 100.0;

/// Fixed cost, in cycles, of performing a frequency change on a type-B
/// (branch) edge. Subtracted from the worst successor's RWCEC.
pub const TYPE_B_OVERHEAD: f32 = 0.0;

/// Fixed cost, in cycles, of performing a frequency change on a type-L
/// (loop-exit) edge. Subtracted from the post-loop RWCEC plus saved cycles.
pub const TYPE_L_OVERHEAD: f32 = 0.0;

/// Size of one programmable frequency step in Hz. The engine works in
/// integer steps; the default of 1 MHz makes `100` mean 100 MHz.
pub const FREQUENCY_UNIT_HZ: u32 = 1_000_000;

/// SysTick frequency in Hz. The clock back-end keeps this tick rate
/// constant across core frequency changes.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz at reset (STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Rejected overhead configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Overhead is NaN or infinite
    NonFinite { edge: &'static str },
    /// Overhead is below zero
    Negative { edge: &'static str, value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonFinite { edge } => {
                write!(f, "{} overhead is not a finite number", edge)
            },
            ConfigError::Negative { edge, value } => {
                write!(f, "{} overhead must not be negative (got {})", edge, value)
            },
        }
    }
}

/// Per-edge-kind frequency-change overheads, in cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverheadConfig {
    pub type_b: f32,
    pub type_l: f32,
}

impl OverheadConfig {
    /// Overheads taken from `TYPE_B_OVERHEAD` / `TYPE_L_OVERHEAD`.
    pub const DEFAULT: Self = Self {
        type_b: TYPE_B_OVERHEAD,
        type_l: TYPE_L_OVERHEAD,
    };

    /// Build a validated overhead record.
    ///
    /// # Errors
    /// - `ConfigError::NonFinite` if either value is NaN or infinite.
    /// - `ConfigError::Negative` if either value is below zero.
    pub fn new(type_b: f32, type_l: f32) -> Result<Self, ConfigError> {
        validate("type-B", type_b)?;
        validate("type-L", type_l)?;
        Ok(Self { type_b, type_l })
    }
}

impl Default for OverheadConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn validate(edge: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { edge });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { edge, value });
    }
    Ok(())
}
