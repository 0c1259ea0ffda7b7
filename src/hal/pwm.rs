//! PWM duty cycle
//!
//! Percent duty cycles and their mapping onto a timer's compare register,
//! plus the channel handle that exposes a timer to `embedded-hal` PWM users.

use core::convert::Infallible;

use super::mmio::Mmio;
use super::timer::Timer;

/// PWM duty cycle in whole percent (0–100)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DutyCycle(u8);

impl DutyCycle {
    /// 0 % duty cycle (output always low)
    pub const ZERO: Self = Self(0);

    /// 50 % duty cycle
    pub const HALF: Self = Self(50);

    /// 100 % duty cycle (output always high)
    pub const FULL: Self = Self(100);

    /// Create from percentage, values above 100 clamp to 100
    #[must_use]
    pub const fn from_percent(percent: u8) -> Self {
        if percent > 100 {
            Self::FULL
        } else {
            Self(percent)
        }
    }

    /// Recover the (truncated) percentage from a compare/auto-reload pair
    #[must_use]
    pub const fn from_compare(compare: u32, auto_reload: u32) -> Self {
        if auto_reload == 0 || compare >= auto_reload {
            return Self::FULL;
        }
        Self((compare as u64 * 100 / auto_reload as u64) as u8)
    }

    /// Get as percentage
    #[must_use]
    pub const fn as_percent(self) -> u8 {
        self.0
    }

    /// Compare value for a timer period: `auto_reload × percent ÷ 100`
    ///
    /// Integer division truncates, so 50 % of an ARR of 999 is 499.
    #[must_use]
    pub const fn compare_value(self, auto_reload: u32) -> u32 {
        (auto_reload as u64 * self.0 as u64 / 100) as u32
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DutyCycle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.0);
    }
}

/// Channel 1 of a timer running in PWM mode
///
/// `max_duty_cycle` is the auto-reload value, capped at `u16::MAX` for the
/// 32-bit timers; duty values are then scaled onto the full ARR range.
pub struct PwmChannel<'t, 'a, B: Mmio> {
    timer: &'t mut Timer<'a, B>,
}

impl<'t, 'a, B: Mmio> PwmChannel<'t, 'a, B> {
    pub(crate) fn new(timer: &'t mut Timer<'a, B>) -> Self {
        Self { timer }
    }

    /// Set the duty cycle in percent, clamped to 100
    pub fn set_percent(&mut self, percent: u8) {
        self.timer.set_duty(percent);
    }

    /// Duty cycle currently loaded
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.timer.duty_cycle().as_percent()
    }
}

impl<B: Mmio> embedded_hal::pwm::ErrorType for PwmChannel<'_, '_, B> {
    type Error = Infallible;
}

impl<B: Mmio> embedded_hal::pwm::SetDutyCycle for PwmChannel<'_, '_, B> {
    fn max_duty_cycle(&self) -> u16 {
        u16::try_from(self.timer.auto_reload()).unwrap_or(u16::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let auto_reload = self.timer.auto_reload();
        let max = u32::from(self.max_duty_cycle());
        let compare = if max == 0 || auto_reload <= max {
            u32::from(duty)
        } else {
            (u64::from(duty) * u64::from(auto_reload) / u64::from(max)) as u32
        };
        self.timer.set_compare(compare);
        Ok(())
    }
}
