//! System Tick Controller
//!
//! The Cortex-M4 24-bit down-counter. It counts from RVR to zero, raises
//! the SysTick exception (if enabled) and reloads on the next clock edge,
//! so the exception period is `reload + 1` clocks; this driver follows the
//! common convention of treating `reload` itself as the period.
//!
//! `set_reload` leaves the current count alone: the period in progress
//! finishes from its old residual value before the new reload takes
//! effect. Callers that need the new period to start immediately follow it
//! with [`SysTick::clear_current`].

use super::mmio::{Block, Field, Mmio};
use super::Peripheral;

/// SysTick base address (SYST_CSR)
pub const SYSTICK_BASE: u32 = 0xE000_E010;

/// Largest value the reload register holds
pub const RELOAD_MAX: u32 = 0x00FF_FFFF;

/// SysTick register offsets
mod reg {
    pub const CSR: u32 = 0x00;
    pub const RVR: u32 = 0x04;
    pub const CVR: u32 = 0x08;
    pub const CALIB: u32 = 0x0C;
}

/// CSR and CALIB bits
mod bits {
    use super::Field;

    pub const ENABLE: u32 = 1 << 0;
    pub const TICKINT: u32 = 1 << 1;
    pub const CLKSOURCE: u32 = 1 << 2;
    pub const COUNTFLAG: u32 = 1 << 16;

    pub const NOREF: u32 = 1 << 31;
    pub const SKEW: u32 = 1 << 30;
    pub const TENMS: Field = Field::new(0, 24);
}

/// Counter clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum ClockSource {
    /// Implementation-defined reference clock (HCLK / 8 on STM32F4)
    External,
    /// Processor clock (HCLK)
    #[default]
    Processor,
}

/// Decoded SYST_CALIB register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct Calibration {
    /// The reference clock is implemented
    pub has_reference: bool,
    /// `ten_ms` is exact for a 10 ms period
    pub exact: bool,
    /// Reload value for 10 ms, zero if unknown
    pub ten_ms: u32,
}

/// Reload value that makes the counter wrap `rate_hz` times a second
///
/// A zero rate gives a zero reload, which keeps the counter stopped.
#[must_use]
pub const fn reload_for(clock_hz: u32, rate_hz: u32) -> u32 {
    if rate_hz == 0 {
        return 0;
    }
    clock_hz / rate_hz
}

/// Wrap rate for a reload value, rounded to the nearest hertz
#[must_use]
pub const fn rate_hz(clock_hz: u32, reload: u32) -> u32 {
    if reload == 0 {
        return 0;
    }
    (clock_hz + reload / 2) / reload
}

/// SysTick driver
pub struct SysTick<'a, B: Mmio> {
    regs: Block<'a, B>,
}

impl<'a, B: Mmio> SysTick<'a, B> {
    /// Bind to the SysTick block on `bus`
    #[must_use]
    pub const fn new(bus: &'a B) -> Self {
        Self {
            regs: Block::new(bus, SYSTICK_BASE),
        }
    }

    /// Peripheral identity (has no RCC gate and no NVIC line)
    #[must_use]
    pub const fn peripheral() -> Peripheral {
        Peripheral::SysTick
    }

    /// Load `reload`, clear the counter, then set clock source, exception
    /// enable and counter enable
    ///
    /// `reload` is masked to 24 bits.
    pub fn configure(&self, reload: u32, clock_source: ClockSource, interrupt_enable: bool) {
        if reload > RELOAD_MAX {
            warn!("SysTick reload {} exceeds 24 bits", reload);
        }
        self.regs.write(reg::RVR, reload & RELOAD_MAX);
        self.clear_current();

        if clock_source == ClockSource::Processor {
            self.regs.set_bits(reg::CSR, bits::CLKSOURCE);
        } else {
            self.regs.clear_bits(reg::CSR, bits::CLKSOURCE);
        }
        if interrupt_enable {
            self.regs.set_bits(reg::CSR, bits::TICKINT);
        } else {
            self.regs.clear_bits(reg::CSR, bits::TICKINT);
        }
        self.regs.set_bits(reg::CSR, bits::ENABLE);

        debug!("SysTick reload {} from {}", reload & RELOAD_MAX, clock_source);
    }

    /// Change the period without touching the running count
    pub fn set_reload(&self, reload: u32) {
        self.regs.write(reg::RVR, reload & RELOAD_MAX);
    }

    /// Reload value currently programmed
    #[must_use]
    pub fn reload(&self) -> u32 {
        self.regs.read(reg::RVR) & RELOAD_MAX
    }

    /// Zero the current value so the counter reloads on the next edge
    ///
    /// Any write clears CVR and COUNTFLAG.
    pub fn clear_current(&self) {
        self.regs.write(reg::CVR, 0);
    }

    /// Current counter value
    #[must_use]
    pub fn current(&self) -> u32 {
        self.regs.read(reg::CVR) & RELOAD_MAX
    }

    /// Whether the counter reached zero since the last CSR read
    ///
    /// Reading CSR clears COUNTFLAG.
    pub fn has_wrapped(&self) -> bool {
        self.regs.is_set(reg::CSR, bits::COUNTFLAG)
    }

    /// Whether the counter is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.regs.is_set(reg::CSR, bits::ENABLE)
    }

    /// Stop the counter and mask the exception
    pub fn disable(&self) {
        self.regs.clear_bits(reg::CSR, bits::ENABLE | bits::TICKINT);
    }

    /// Read the calibration register
    #[must_use]
    pub fn calibration(&self) -> Calibration {
        let calib = self.regs.read(reg::CALIB);
        Calibration {
            has_reference: calib & bits::NOREF == 0,
            exact: calib & bits::SKEW == 0,
            ten_ms: bits::TENMS.extract(calib),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hz_reload() {
        assert_eq!(reload_for(16_000_000, 12), 1_333_333);
        assert_eq!(rate_hz(16_000_000, 1_333_333), 12);
    }

    #[test]
    fn zero_reload_has_no_rate() {
        assert_eq!(rate_hz(16_000_000, 0), 0);
    }

    #[test]
    fn one_hz_fits_24_bits_at_hsi() {
        assert!(reload_for(16_000_000, 1) <= RELOAD_MAX);
        assert!(reload_for(20_000_000, 1) > RELOAD_MAX);
    }
}
