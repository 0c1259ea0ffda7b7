//! GPIO Controller
//!
//! Pin configuration and I/O on ports A–H. Configuration writes touch only
//! the addressed pin's field in each register, so neighboring pins keep
//! their settings.
//!
//! # Concurrency
//!
//! [`Gpio::write`] goes through BSRR and is safe to call from an interrupt
//! handler while foreground code configures a *different* pin of the same
//! port. [`Gpio::toggle`] is a read-modify-write of ODR: callers must not
//! run it concurrently with any other read-modify-write on the same port
//! (another `toggle`, `configure`, `set_alternate_function`). Code that
//! toggles from an interrupt should own an [`Output`] instead, which
//! toggles through BSRR.

use core::convert::Infallible;

use super::mmio::{Block, Field, Mmio};
use super::rcc::ClockGate;
use super::Peripheral;
use crate::types::{AltFunction, Level, Mode, OutputType, Pin, PinConfig, Port, Pull, Speed};

/// GPIOA base address
pub const GPIO_BASE: u32 = 0x4002_0000;

/// Distance between consecutive port blocks
pub const PORT_STRIDE: u32 = 0x400;

/// GPIO register offsets
mod reg {
    pub const MODER: u32 = 0x00;
    pub const OTYPER: u32 = 0x04;
    pub const OSPEEDR: u32 = 0x08;
    pub const PUPDR: u32 = 0x0C;
    pub const IDR: u32 = 0x10;
    pub const ODR: u32 = 0x14;
    pub const BSRR: u32 = 0x18;
    pub const AFRL: u32 = 0x20;
    pub const AFRH: u32 = 0x24;
}

/// Base address of a port's register block
#[must_use]
pub const fn port_base(port: Port) -> u32 {
    GPIO_BASE + PORT_STRIDE * port.index() as u32
}

/// BSRR word that drives `pin` to `level`: bit `n` sets, bit `n + 16` resets
#[must_use]
pub const fn bsrr_word(pin: Pin, level: Level) -> u32 {
    match level {
        Level::High => 1 << pin.index(),
        Level::Low => 1 << (pin.index() + 16),
    }
}

/// AFRL/AFRH register and field holding a pin's selector
const fn af_location(pin: Pin) -> (u32, Field) {
    if pin.index() < 8 {
        (reg::AFRL, Field::nth(pin.index(), 4))
    } else {
        (reg::AFRH, Field::nth(pin.index() - 8, 4))
    }
}

/// GPIO driver for all ports
pub struct Gpio<'a, B: Mmio> {
    bus: &'a B,
    rcc: ClockGate<'a, B>,
}

impl<'a, B: Mmio> Gpio<'a, B> {
    /// Bind to the GPIO ports on `bus`
    #[must_use]
    pub const fn new(bus: &'a B) -> Self {
        Self {
            bus,
            rcc: ClockGate::new(bus),
        }
    }

    fn block(&self, port: Port) -> Block<'a, B> {
        Block::new(self.bus, port_base(port))
    }

    fn enable_clock(&self, port: Port) {
        if let Err(e) = self.rcc.enable(Peripheral::Gpio(port)) {
            warn!("{} clock not gated: {}", port, e);
        }
    }

    /// Configure mode, output type, speed and pull of one pin
    ///
    /// Gates the port clock on first. Idempotent.
    pub fn configure(&self, pin: Pin, mode: Mode, output_type: OutputType, speed: Speed, pull: Pull) {
        self.enable_clock(pin.port());
        let port = self.block(pin.port());
        let n = pin.index();

        port.write_field(reg::MODER, Field::nth(n, 2), mode.bits());
        port.write_field(reg::OTYPER, Field::bit(n), output_type.bits());
        port.write_field(reg::OSPEEDR, Field::nth(n, 2), speed.bits());
        port.write_field(reg::PUPDR, Field::nth(n, 2), pull.bits());

        trace!("{} configured as {}", pin, mode);
    }

    /// Apply a full [`PinConfig`], including the AF selector in AF mode
    pub fn apply(&self, pin: Pin, config: PinConfig) {
        if config.mode == Mode::AlternateFunction {
            self.write_alternate(pin, config.alternate);
        }
        self.configure(pin, config.mode, config.output_type, config.speed, config.pull);
    }

    /// Route a pin to a peripheral signal
    ///
    /// Forces alternate-function mode with push-pull, high speed and no pull,
    /// then writes the 4-bit selector into AFRL (pins 0–7) or AFRH (8–15).
    pub fn set_alternate_function(&self, pin: Pin, af: AltFunction) {
        self.configure(
            pin,
            Mode::AlternateFunction,
            OutputType::PushPull,
            Speed::High,
            Pull::None,
        );
        self.write_alternate(pin, af);
        debug!("{} routed to {}", pin, af);
    }

    fn write_alternate(&self, pin: Pin, af: AltFunction) {
        self.enable_clock(pin.port());
        let (register, field) = af_location(pin);
        self.block(pin.port())
            .write_field(register, field, u32::from(af.index()));
    }

    /// Drive a pin through the atomic set/reset register
    pub fn write(&self, pin: Pin, level: Level) {
        self.block(pin.port()).write(reg::BSRR, bsrr_word(pin, level));
    }

    /// Sample a pin's input level
    #[must_use]
    pub fn read(&self, pin: Pin) -> Level {
        Level::from_bit(self.block(pin.port()).is_set(reg::IDR, pin.mask()))
    }

    /// Invert a pin's output data bit (read-modify-write of ODR)
    ///
    /// Foreground-only; see the module documentation.
    pub fn toggle(&self, pin: Pin) {
        let mask = pin.mask();
        self.block(pin.port()).modify(reg::ODR, |odr| odr ^ mask);
    }

    /// Whether the output data bit is set
    ///
    /// This is the driven state, not the pad level; an open-drain pin
    /// reports `true` even while another device pulls the line low.
    #[must_use]
    pub fn is_set(&self, pin: Pin) -> bool {
        self.block(pin.port()).is_set(reg::ODR, pin.mask())
    }

    /// Read a pin's configuration back from the port registers
    #[must_use]
    pub fn config(&self, pin: Pin) -> PinConfig {
        let port = self.block(pin.port());
        let n = pin.index();
        let (af_register, af_field) = af_location(pin);
        // A 4-bit field always holds a valid selector
        let alternate = AltFunction::new(port.read_field(af_register, af_field) as u8).unwrap_or_default();

        PinConfig {
            mode: Mode::from_bits(port.read_field(reg::MODER, Field::nth(n, 2))),
            output_type: OutputType::from_bits(port.read_field(reg::OTYPER, Field::bit(n))),
            speed: Speed::from_bits(port.read_field(reg::OSPEEDR, Field::nth(n, 2))),
            pull: Pull::from_bits(port.read_field(reg::PUPDR, Field::nth(n, 2))),
            alternate,
        }
    }

    /// Configure a push-pull output and take ownership of it
    ///
    /// The level is latched in ODR before the pin switches to output mode,
    /// so the pad never glitches to the opposite level.
    pub fn output(&self, pin: Pin, initial: Level) -> Output<'a, B> {
        self.enable_clock(pin.port());
        self.write(pin, initial);
        self.configure(pin, Mode::Output, OutputType::PushPull, Speed::Low, Pull::None);
        Output {
            port: self.block(pin.port()),
            pin,
            state: initial,
        }
    }

    /// Configure an input and take ownership of it
    pub fn input(&self, pin: Pin, pull: Pull) -> Input<'a, B> {
        self.configure(pin, Mode::Input, OutputType::PushPull, Speed::Low, pull);
        Input {
            port: self.block(pin.port()),
            pin,
        }
    }
}

/// Owned output pin
///
/// Remembers the last level it drove and toggles by writing the opposite
/// level to BSRR, so it never reads ODR. Safe to own from an interrupt
/// handler while other code drives other pins of the same port.
pub struct Output<'a, B: Mmio> {
    port: Block<'a, B>,
    pin: Pin,
    state: Level,
}

impl<B: Mmio> Output<'_, B> {
    /// Pin this handle drives
    #[must_use]
    pub const fn pin(&self) -> Pin {
        self.pin
    }

    /// Drive the pin to `level`
    pub fn set(&mut self, level: Level) {
        self.port.write(reg::BSRR, bsrr_word(self.pin, level));
        self.state = level;
    }

    /// Drive high
    pub fn set_high(&mut self) {
        self.set(Level::High);
    }

    /// Drive low
    pub fn set_low(&mut self) {
        self.set(Level::Low);
    }

    /// Drive the opposite of the last written level
    pub fn toggle(&mut self) {
        self.set(self.state.toggle());
    }

    /// Last level written through this handle
    #[must_use]
    pub const fn state(&self) -> Level {
        self.state
    }
}

impl<B: Mmio> embedded_hal::digital::ErrorType for Output<'_, B> {
    type Error = Infallible;
}

impl<B: Mmio> embedded_hal::digital::OutputPin for Output<'_, B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Output::set_low(self);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Output::set_high(self);
        Ok(())
    }
}

impl<B: Mmio> embedded_hal::digital::StatefulOutputPin for Output<'_, B> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.is_high())
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Output::toggle(self);
        Ok(())
    }
}

/// Owned input pin
pub struct Input<'a, B: Mmio> {
    port: Block<'a, B>,
    pin: Pin,
}

impl<B: Mmio> Input<'_, B> {
    /// Pin this handle samples
    #[must_use]
    pub const fn pin(&self) -> Pin {
        self.pin
    }

    /// Current input level
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_bit(self.port.is_set(reg::IDR, self.pin.mask()))
    }
}

impl<B: Mmio> embedded_hal::digital::ErrorType for Input<'_, B> {
    type Error = Infallible;
}

impl<B: Mmio> embedded_hal::digital::InputPin for Input<'_, B> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level().is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level().is_high())
    }
}
