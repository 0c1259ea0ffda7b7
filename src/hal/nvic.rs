//! Interrupt Controller
//!
//! Set-enable / clear-enable registers of the NVIC. Both register banks are
//! write-one-to-act, so enabling or masking a line is a single store that
//! cannot disturb other lines.

use super::mmio::{Block, Mmio};
use super::serial::UsartId;
use super::timer::TimerId;
use super::{Error, Peripheral, Result};

/// NVIC base address (ISER0)
pub const NVIC_BASE: u32 = 0xE000_E100;

/// NVIC register offsets
mod reg {
    /// ISER0..ISER7
    pub const ISER: u32 = 0x000;
    /// ICER0..ICER7
    pub const ICER: u32 = 0x080;
}

/// Device interrupt numbers, RM0390 table 38
pub static IRQ_LINES: [(Peripheral, u8); 10] = [
    (Peripheral::Timer(TimerId::Tim2), 28),
    (Peripheral::Timer(TimerId::Tim3), 29),
    (Peripheral::Timer(TimerId::Tim4), 30),
    (Peripheral::Usart(UsartId::Usart1), 37),
    (Peripheral::Usart(UsartId::Usart2), 38),
    (Peripheral::Usart(UsartId::Usart3), 39),
    (Peripheral::Timer(TimerId::Tim5), 50),
    (Peripheral::Usart(UsartId::Uart4), 52),
    (Peripheral::Usart(UsartId::Uart5), 53),
    (Peripheral::Usart(UsartId::Usart6), 71),
];

/// Look up the interrupt number of a peripheral
#[must_use]
pub fn irq_of(peripheral: Peripheral) -> Option<u8> {
    IRQ_LINES
        .iter()
        .find(|(p, _)| *p == peripheral)
        .map(|&(_, irq)| irq)
}

/// Word offset and bit mask of an interrupt number in ISER/ICER
#[must_use]
pub const fn line_position(irq: u8) -> (u32, u32) {
    ((irq as u32 / 32) * 4, 1 << (irq % 32))
}

/// NVIC enable/disable driver
pub struct Nvic<'a, B: Mmio> {
    nvic: Block<'a, B>,
}

impl<'a, B: Mmio> Nvic<'a, B> {
    /// Bind to the NVIC on `bus`
    #[must_use]
    pub const fn new(bus: &'a B) -> Self {
        Self {
            nvic: Block::new(bus, NVIC_BASE),
        }
    }

    /// Unmask the peripheral's interrupt line
    pub fn enable(&self, peripheral: Peripheral) -> Result<()> {
        let (word, mask) = line_position(Self::lookup(peripheral)?);
        self.nvic.write(reg::ISER + word, mask);
        Ok(())
    }

    /// Mask the peripheral's interrupt line
    pub fn disable(&self, peripheral: Peripheral) -> Result<()> {
        let (word, mask) = line_position(Self::lookup(peripheral)?);
        self.nvic.write(reg::ICER + word, mask);
        Ok(())
    }

    /// Whether the peripheral's interrupt line is unmasked
    pub fn is_enabled(&self, peripheral: Peripheral) -> Result<bool> {
        let (word, mask) = line_position(Self::lookup(peripheral)?);
        Ok(self.nvic.is_set(reg::ISER + word, mask))
    }

    fn lookup(peripheral: Peripheral) -> Result<u8> {
        irq_of(peripheral).ok_or_else(|| {
            warn!("no interrupt line for {}", peripheral);
            Error::Unsupported(peripheral)
        })
    }
}
