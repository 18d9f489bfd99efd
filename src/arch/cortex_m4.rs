//! # Cortex-M4 Port Layer
//!
//! Frequency back-end for the ARM Cortex-M4. The core clock tree itself
//! (PLL, flash wait states, voltage scaling) is vendor specific and is
//! supplied by the board as a plain function. This layer owns what every
//! Cortex-M4 shares: the SysTick timer, whose reload must follow the core
//! clock so the system tick keeps its period after a frequency change.
//!
//! ## Frequency Change Sequence
//!
//! ```text
//! SpeedUpdateEngine::apply_decision()
//!   └─► SysTickClock::set(steps)
//!         ├─► board clock hook (steps)   ← reprogram PLL / dividers
//!         └─► SysTick reload = steps × FREQUENCY_UNIT_HZ / TICK_HZ - 1
//! ```

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::config::{FREQUENCY_UNIT_HZ, SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::freq::FrequencyControl;

/// Largest value the 24-bit SysTick reload register accepts.
pub const SYST_RELOAD_MAX: u32 = 0x00FF_FFFF;

/// Board hook that reprograms the core clock to `steps` frequency steps.
pub type ClockHook = fn(u32);

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// SysTick reload for a core clock of `steps` × `FREQUENCY_UNIT_HZ`.
///
/// `None` when the clock is too slow for one tick per `TICK_HZ` period or
/// too fast for the 24-bit reload register.
pub fn systick_reload(steps: u32) -> Option<u32> {
    let core_hz = steps as u64 * FREQUENCY_UNIT_HZ as u64;
    let cycles_per_tick = core_hz / TICK_HZ as u64;
    if cycles_per_tick < 2 {
        return None;
    }
    let reload = cycles_per_tick - 1;
    if reload > SYST_RELOAD_MAX as u64 {
        return None;
    }
    Some(reload as u32)
}

/// Start SysTick at `TICK_HZ` from the processor clock.
pub fn configure_systick(syst: &mut SYST, reload: u32) {
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Frequency back-end
// ---------------------------------------------------------------------------

/// `FrequencyControl` for a Cortex-M4 whose tick comes from SysTick.
pub struct SysTickClock {
    syst: SYST,
    steps: u32,
    hook: ClockHook,
}

impl SysTickClock {
    /// Take ownership of SysTick, running at the reset clock.
    pub fn new(mut syst: SYST, hook: ClockHook) -> Self {
        let steps = SYSTEM_CLOCK_HZ / FREQUENCY_UNIT_HZ;
        configure_systick(&mut syst, SYSTEM_CLOCK_HZ / TICK_HZ - 1);
        Self { syst, steps, hook }
    }

    /// Current core clock in frequency steps.
    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Give SysTick back, e.g. to hand it to a scheduler.
    pub fn free(self) -> SYST {
        self.syst
    }
}

impl FrequencyControl for SysTickClock {
    fn current(&self) -> f32 {
        self.steps as f32
    }

    fn accepts(&self, freq: u32) -> bool {
        systick_reload(freq).is_some()
    }

    fn set(&mut self, freq: u32) {
        let Some(reload) = systick_reload(freq) else {
            log::warn!("cortex-m4: {} steps out of SysTick range, ignored", freq);
            return;
        };

        (self.hook)(freq);
        self.steps = freq;

        self.syst.disable_counter();
        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.enable_counter();
    }
}
