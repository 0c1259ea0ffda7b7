//! Clock Gate Controller
//!
//! Peripheral clock enables in the RCC. A peripheral whose clock is gated
//! off ignores register writes (or faults the bus), so every driver calls
//! [`ClockGate::enable`] before touching its block.
//!
//! The bit for each peripheral comes from one static table instead of a
//! comparison chain per driver; identities with no entry are reported as
//! [`Error::Unsupported`].

use super::mmio::{Block, Mmio};
use super::serial::UsartId;
use super::timer::TimerId;
use super::{Error, Result};
use crate::types::Port;

/// RCC base address
pub const RCC_BASE: u32 = 0x4002_3800;

/// RCC register offsets
mod reg {
    pub const AHB1ENR: u32 = 0x30;
    pub const APB1ENR: u32 = 0x40;
    pub const APB2ENR: u32 = 0x44;
}

/// Peripheral identity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Peripheral {
    /// A GPIO port
    Gpio(Port),
    /// A general-purpose timer
    Timer(TimerId),
    /// A USART/UART
    Usart(UsartId),
    /// The core system timer (always clocked, no RCC gate, no NVIC line)
    SysTick,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Peripheral {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Gpio(port) => defmt::write!(f, "{}", port),
            Self::Timer(id) => defmt::write!(f, "{}", id),
            Self::Usart(id) => defmt::write!(f, "{}", id),
            Self::SysTick => defmt::write!(f, "SysTick"),
        }
    }
}

/// Bus whose enable register holds a gate bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Bus {
    /// AHB1 (GPIO ports)
    Ahb1,
    /// APB1 (TIM2..5, USART2..3, UART4..5)
    Apb1,
    /// APB2 (USART1, USART6)
    Apb2,
}

impl Bus {
    /// Offset of the bus clock-enable register within the RCC
    #[must_use]
    pub const fn enable_register(self) -> u32 {
        match self {
            Self::Ahb1 => reg::AHB1ENR,
            Self::Apb1 => reg::APB1ENR,
            Self::Apb2 => reg::APB2ENR,
        }
    }
}

/// Location of one peripheral's clock-enable bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct Gate {
    /// Bus enable register
    pub bus: Bus,
    /// Bit within it
    pub bit: u8,
}

impl Gate {
    const fn new(bus: Bus, bit: u8) -> Self {
        Self { bus, bit }
    }

    /// Mask of the gate bit
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.bit
    }
}

/// Clock-enable bits, RM0390 §6.3
pub static CLOCK_GATES: [(Peripheral, Gate); 18] = [
    (Peripheral::Gpio(Port::A), Gate::new(Bus::Ahb1, 0)),
    (Peripheral::Gpio(Port::B), Gate::new(Bus::Ahb1, 1)),
    (Peripheral::Gpio(Port::C), Gate::new(Bus::Ahb1, 2)),
    (Peripheral::Gpio(Port::D), Gate::new(Bus::Ahb1, 3)),
    (Peripheral::Gpio(Port::E), Gate::new(Bus::Ahb1, 4)),
    (Peripheral::Gpio(Port::F), Gate::new(Bus::Ahb1, 5)),
    (Peripheral::Gpio(Port::G), Gate::new(Bus::Ahb1, 6)),
    (Peripheral::Gpio(Port::H), Gate::new(Bus::Ahb1, 7)),
    (Peripheral::Timer(TimerId::Tim2), Gate::new(Bus::Apb1, 0)),
    (Peripheral::Timer(TimerId::Tim3), Gate::new(Bus::Apb1, 1)),
    (Peripheral::Timer(TimerId::Tim4), Gate::new(Bus::Apb1, 2)),
    (Peripheral::Timer(TimerId::Tim5), Gate::new(Bus::Apb1, 3)),
    (Peripheral::Usart(UsartId::Usart2), Gate::new(Bus::Apb1, 17)),
    (Peripheral::Usart(UsartId::Usart3), Gate::new(Bus::Apb1, 18)),
    (Peripheral::Usart(UsartId::Uart4), Gate::new(Bus::Apb1, 19)),
    (Peripheral::Usart(UsartId::Uart5), Gate::new(Bus::Apb1, 20)),
    (Peripheral::Usart(UsartId::Usart1), Gate::new(Bus::Apb2, 4)),
    (Peripheral::Usart(UsartId::Usart6), Gate::new(Bus::Apb2, 5)),
];

/// Look up the clock gate of a peripheral
#[must_use]
pub fn gate_of(peripheral: Peripheral) -> Option<Gate> {
    CLOCK_GATES
        .iter()
        .find(|(p, _)| *p == peripheral)
        .map(|&(_, gate)| gate)
}

/// RCC clock-gate driver
pub struct ClockGate<'a, B: Mmio> {
    rcc: Block<'a, B>,
}

impl<'a, B: Mmio> ClockGate<'a, B> {
    /// Bind to the RCC on `bus`
    #[must_use]
    pub const fn new(bus: &'a B) -> Self {
        Self {
            rcc: Block::new(bus, RCC_BASE),
        }
    }

    /// Enable the peripheral's bus clock
    ///
    /// The enable register is read back before returning, so the gate is
    /// live by the time the caller's first register access issues.
    pub fn enable(&self, peripheral: Peripheral) -> Result<()> {
        let gate = Self::lookup(peripheral)?;
        let offset = gate.bus.enable_register();
        self.rcc.set_bits(offset, gate.mask());
        let _ = self.rcc.read(offset);
        trace!("clock on: {}", peripheral);
        Ok(())
    }

    /// Disable the peripheral's bus clock
    pub fn disable(&self, peripheral: Peripheral) -> Result<()> {
        let gate = Self::lookup(peripheral)?;
        self.rcc.clear_bits(gate.bus.enable_register(), gate.mask());
        trace!("clock off: {}", peripheral);
        Ok(())
    }

    /// Whether the peripheral's bus clock is enabled
    pub fn is_enabled(&self, peripheral: Peripheral) -> Result<bool> {
        let gate = Self::lookup(peripheral)?;
        Ok(self.rcc.is_set(gate.bus.enable_register(), gate.mask()))
    }

    fn lookup(peripheral: Peripheral) -> Result<Gate> {
        gate_of(peripheral).ok_or_else(|| {
            warn!("no clock gate for {}", peripheral);
            Error::Unsupported(peripheral)
        })
    }
}
