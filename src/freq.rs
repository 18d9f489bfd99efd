//! # Frequency Capability
//!
//! The boundary between the engine and the hardware: a source for the
//! current operating frequency and a primitive that programs a new one.
//! The engine is generic over this trait, so a board port, the SysTick
//! back-end in `arch`, or a test double can be substituted freely.

use crate::config::DEFAULT_FREQUENCY;

/// Read and program the processor operating frequency.
///
/// Frequencies are in integer steps of `config::FREQUENCY_UNIT_HZ`.
pub trait FrequencyControl {
    /// Present operating frequency. Must not have side effects.
    fn current(&self) -> f32;

    /// Program a new operating frequency. Fire-and-forget: the engine
    /// observes no result.
    fn set(&mut self, freq: u32);

    /// Whether `set(freq)` would take effect. The engine holds instead of
    /// issuing a target the back-end cannot program.
    fn accepts(&self, _freq: u32) -> bool {
        true
    }
}

/// Stub frequency source for targets without a frequency reader.
///
/// Always reports `DEFAULT_FREQUENCY`; `set` is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFrequency;

impl FrequencyControl for FixedFrequency {
    #[inline]
    fn current(&self) -> f32 {
        DEFAULT_FREQUENCY
    }

    #[inline]
    fn set(&mut self, _freq: u32) {}
}

/// Test double recording every frequency change.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeFrequency {
    pub current: f32,
    /// Lowest frequency the fake accepts.
    pub floor: u32,
    pub set_calls: u32,
    pub last_set: Option<u32>,
}

#[cfg(test)]
impl FakeFrequency {
    pub(crate) fn new(current: f32) -> Self {
        Self {
            current,
            floor: 0,
            set_calls: 0,
            last_set: None,
        }
    }
}

#[cfg(test)]
impl FrequencyControl for FakeFrequency {
    fn current(&self) -> f32 {
        self.current
    }

    fn set(&mut self, freq: u32) {
        self.set_calls += 1;
        self.last_set = Some(freq);
    }

    fn accepts(&self, freq: u32) -> bool {
        freq >= self.floor
    }
}
