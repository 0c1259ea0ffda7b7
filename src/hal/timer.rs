//! Timer Controller
//!
//! Lifecycle control of the general-purpose timers TIM2–TIM5: periodic
//! update interrupts and PWM generation on channel 1.
//!
//! ```text
//!            configure            start
//! Stopped ─────────────► Configured ─────► Running
//!    ▲                                        │
//!    └────────────────── stop ────────────────┘
//! ```
//!
//! `start` brings the clock up before the counter and unmasks the NVIC line
//! before the first update event can fire; `stop` undoes the three steps in
//! reverse so no interrupt arrives for a timer whose clock is being cut.

use super::mmio::{Block, Field, Mmio};
use super::nvic::Nvic;
use super::pwm::{DutyCycle, PwmChannel};
use super::rcc::ClockGate;
use super::{Peripheral, Result};
use crate::config::{TIMER_1KHZ_PRESCALER, TIMER_1SEC_ARR};

/// Timer register offsets
mod reg {
    pub const CR1: u32 = 0x00;
    pub const DIER: u32 = 0x0C;
    pub const SR: u32 = 0x10;
    pub const EGR: u32 = 0x14;
    pub const CCMR1: u32 = 0x18;
    pub const CCER: u32 = 0x20;
    pub const CNT: u32 = 0x24;
    pub const PSC: u32 = 0x28;
    pub const ARR: u32 = 0x2C;
    pub const CCR1: u32 = 0x34;
}

/// Register bits
mod bits {
    use super::Field;

    /// CR1: counter enable
    pub const CEN: u32 = 1 << 0;
    /// CR1: auto-reload preload enable
    pub const ARPE: u32 = 1 << 7;
    /// DIER: update interrupt enable
    pub const UIE: u32 = 1 << 0;
    /// SR: update interrupt flag
    pub const UIF: u32 = 1 << 0;
    /// EGR: update generation
    pub const UG: u32 = 1 << 0;
    /// CCMR1: output compare 1 preload enable
    pub const OC1PE: u32 = 1 << 3;
    /// CCMR1: output compare 1 mode
    pub const OC1M: Field = Field::new(4, 3);
    /// OC1M encoding of PWM mode 1
    pub const PWM_MODE_1: u32 = 0b110;
    /// CCER: capture/compare 1 output enable
    pub const CC1E: u32 = 1 << 0;
}

/// General-purpose timer identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum TimerId {
    /// TIM2 (32-bit)
    Tim2,
    /// TIM3 (16-bit)
    Tim3,
    /// TIM4 (16-bit)
    Tim4,
    /// TIM5 (32-bit)
    Tim5,
}

impl TimerId {
    /// All general-purpose timers
    pub const ALL: [Self; 4] = [Self::Tim2, Self::Tim3, Self::Tim4, Self::Tim5];

    /// Register block base address
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::Tim2 => 0x4000_0000,
            Self::Tim3 => 0x4000_0400,
            Self::Tim4 => 0x4000_0800,
            Self::Tim5 => 0x4000_0C00,
        }
    }

    /// Peripheral identity for the clock-gate and interrupt tables
    #[must_use]
    pub const fn peripheral(self) -> Peripheral {
        Peripheral::Timer(self)
    }

    /// Largest auto-reload value the counter holds
    #[must_use]
    pub const fn max_auto_reload(self) -> u32 {
        match self {
            Self::Tim2 | Self::Tim5 => u32::MAX,
            Self::Tim3 | Self::Tim4 => 0xFFFF,
        }
    }
}

/// Prescaler and auto-reload pair
///
/// tick frequency = input clock / (prescaler + 1);
/// period = auto_reload + 1 ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct Timing {
    /// PSC value (16-bit)
    pub prescaler: u16,
    /// ARR value
    pub auto_reload: u32,
}

impl Timing {
    /// 1 kHz tick, 1 second period at a 16 MHz input clock
    pub const DEFAULT: Self = Self {
        prescaler: TIMER_1KHZ_PRESCALER as u16,
        auto_reload: TIMER_1SEC_ARR,
    };

    /// Create from raw register values
    #[must_use]
    pub const fn new(prescaler: u16, auto_reload: u32) -> Self {
        Self {
            prescaler,
            auto_reload,
        }
    }

    /// Counter tick frequency for an input clock
    #[must_use]
    pub const fn tick_hz(self, clock_hz: u32) -> u32 {
        clock_hz / (self.prescaler as u32 + 1)
    }

    /// Period length in counter ticks
    #[must_use]
    pub const fn period_ticks(self) -> u64 {
        self.auto_reload as u64 + 1
    }

    /// Period length in microseconds for an input clock
    #[must_use]
    pub const fn period_us(self, clock_hz: u32) -> u64 {
        self.period_ticks() * (self.prescaler as u64 + 1) * 1_000_000 / clock_hz as u64
    }

    /// Update-event rate in Hz for an input clock
    #[must_use]
    pub const fn update_hz(self, clock_hz: u32) -> u32 {
        (self.tick_hz(clock_hz) as u64 / self.period_ticks()) as u32
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lifecycle state of a timer driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum TimerState {
    /// Clock gated off, counter disabled
    #[default]
    Stopped,
    /// Prescaler and auto-reload written
    Configured,
    /// Counter enabled
    Running,
}

/// Driver for one of TIM2–TIM5
pub struct Timer<'a, B: Mmio> {
    id: TimerId,
    regs: Block<'a, B>,
    rcc: ClockGate<'a, B>,
    nvic: Nvic<'a, B>,
    timing: Timing,
    state: TimerState,
}

impl<'a, B: Mmio> Timer<'a, B> {
    /// Bind to timer `id` on `bus` with the default timing
    #[must_use]
    pub const fn new(bus: &'a B, id: TimerId) -> Self {
        Self {
            id,
            regs: Block::new(bus, id.base()),
            rcc: ClockGate::new(bus),
            nvic: Nvic::new(bus),
            timing: Timing::DEFAULT,
            state: TimerState::Stopped,
        }
    }

    /// Timer identity
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Timing written by the next `configure`
    #[must_use]
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Override the default timing; takes effect at the next `configure`,
    /// `start` or `enable_pwm`
    ///
    /// The auto-reload value is capped at the counter width.
    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = Timing {
            auto_reload: timing.auto_reload.min(self.id.max_auto_reload()),
            ..timing
        };
    }

    /// Write prescaler and auto-reload
    ///
    /// The peripheral clock must already be on.
    pub fn configure(&mut self) {
        self.regs.write(reg::PSC, u32::from(self.timing.prescaler));
        self.regs.write(reg::ARR, self.timing.auto_reload);
        if self.state == TimerState::Stopped {
            self.state = TimerState::Configured;
        }
    }

    /// Start periodic update interrupts
    ///
    /// Clock on, NVIC line unmasked, timing written, update interrupt
    /// enabled, then counter enabled.
    pub fn start(&mut self) -> Result<()> {
        let peripheral = self.id.peripheral();
        self.rcc.enable(peripheral)?;
        self.nvic.enable(peripheral)?;
        self.configure();
        // Latch PSC now so the first period has the configured length, and
        // drop the flag that update raises
        self.regs.write(reg::EGR, bits::UG);
        self.regs.write(reg::SR, !bits::UIF);
        self.regs.set_bits(reg::DIER, bits::UIE);
        self.regs.set_bits(reg::CR1, bits::CEN);
        self.state = TimerState::Running;
        debug!("{} running: {}", self.id, self.timing);
        Ok(())
    }

    /// Stop the counter, mask the interrupt line, gate the clock off
    pub fn stop(&mut self) -> Result<()> {
        let peripheral = self.id.peripheral();
        self.regs.clear_bits(reg::CR1, bits::CEN);
        self.nvic.disable(peripheral)?;
        self.rcc.disable(peripheral)?;
        self.state = TimerState::Stopped;
        debug!("{} stopped", self.id);
        Ok(())
    }

    /// Run channel 1 in PWM mode 1 with a 0 % duty cycle
    ///
    /// Compare and auto-reload preload are both enabled, so later duty or
    /// period changes take effect at the next update event instead of
    /// mid-period. The output pin still has to be routed to the timer's
    /// alternate function.
    pub fn enable_pwm(&mut self) -> Result<()> {
        self.rcc.enable(self.id.peripheral())?;
        self.configure();
        self.regs.write_field(reg::CCMR1, bits::OC1M, bits::PWM_MODE_1);
        self.regs.set_bits(reg::CCMR1, bits::OC1PE);
        self.regs.write(reg::CCR1, 0);
        self.regs.write(reg::EGR, bits::UG);
        self.regs.set_bits(reg::CCER, bits::CC1E);
        self.regs.set_bits(reg::CR1, bits::ARPE);
        self.regs.set_bits(reg::CR1, bits::CEN);
        self.state = TimerState::Running;
        debug!("{} PWM on channel 1", self.id);
        Ok(())
    }

    /// Set the channel 1 duty cycle in percent, clamped to 100
    ///
    /// compare = ARR × percent ÷ 100, truncated. 0 % keeps the output low
    /// for the whole period, 100 % keeps it high.
    pub fn set_duty(&mut self, percent: u8) {
        self.set_duty_cycle(DutyCycle::from_percent(percent));
    }

    /// Set the channel 1 duty cycle
    pub fn set_duty_cycle(&mut self, duty: DutyCycle) {
        let compare = duty.compare_value(self.auto_reload());
        self.regs.write(reg::CCR1, compare);
    }

    /// Duty cycle currently loaded in CCR1
    #[must_use]
    pub fn duty_cycle(&self) -> DutyCycle {
        DutyCycle::from_compare(self.compare(), self.auto_reload())
    }

    /// Auto-reload value in the ARR register
    #[must_use]
    pub fn auto_reload(&self) -> u32 {
        self.regs.read(reg::ARR)
    }

    /// Raw channel 1 compare value
    #[must_use]
    pub fn compare(&self) -> u32 {
        self.regs.read(reg::CCR1)
    }

    /// Write the channel 1 compare value, limited to ARR
    pub fn set_compare(&mut self, compare: u32) {
        let limit = self.auto_reload();
        self.regs.write(reg::CCR1, compare.min(limit));
    }

    /// Live counter value
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.regs.read(reg::CNT)
    }

    /// Acknowledge a pending update event
    ///
    /// Returns `true` and clears SR.UIF if it was set. Meant for the timer's
    /// interrupt handler.
    pub fn take_update(&mut self) -> bool {
        if self.regs.is_set(reg::SR, bits::UIF) {
            // rc_w0: writing 1 leaves the other flags untouched
            self.regs.write(reg::SR, !bits::UIF);
            true
        } else {
            false
        }
    }

    /// Channel 1 handle implementing `embedded_hal::pwm::SetDutyCycle`
    pub fn pwm_channel(&mut self) -> PwmChannel<'_, 'a, B> {
        PwmChannel::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_is_one_second() {
        let timing = Timing::DEFAULT;
        assert_eq!(timing.tick_hz(16_000_000), 1_000);
        assert_eq!(timing.period_ticks(), 1_000);
        assert_eq!(timing.period_us(16_000_000), 1_000_000);
        assert_eq!(timing.update_hz(16_000_000), 1);
    }

    #[test]
    fn counter_widths() {
        assert_eq!(TimerId::Tim2.max_auto_reload(), u32::MAX);
        assert_eq!(TimerId::Tim4.max_auto_reload(), 0xFFFF);
    }

    #[test]
    fn pwm_mode_field() {
        assert_eq!(bits::OC1M.place(bits::PWM_MODE_1), 0x60);
    }
}
