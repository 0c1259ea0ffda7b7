//! Serial Transport
//!
//! Polled character I/O over a USART, fixed at 8 data bits, no parity,
//! one stop bit. There is no buffering: each character is one status poll
//! followed by one data-register access.
//!
//! [`Serial::send`] and [`Serial::receive`] wait for the hardware without
//! limit; a silent peer stalls the caller forever. The `_with_deadline`
//! variants take a [`Deadline`] and give up with [`Error::Timeout`].

use super::gpio::Gpio;
use super::mmio::{Block, Mmio};
use super::rcc::ClockGate;
use super::{Error, Peripheral, Result};
use crate::config::{pins, CLEAR_SCREEN, DEFAULT_BAUD, PCLK1_HZ, PCLK2_HZ, SERIAL_POLL_BUDGET};
use crate::types::{AltFunction, Pin};

/// USART register offsets
mod reg {
    pub const SR: u32 = 0x00;
    pub const DR: u32 = 0x04;
    pub const BRR: u32 = 0x08;
    pub const CR1: u32 = 0x0C;
    pub const CR2: u32 = 0x10;
}

/// Register bits
mod bits {
    /// SR: receive data register not empty
    pub const RXNE: u32 = 1 << 5;
    /// SR: transmission complete
    pub const TC: u32 = 1 << 6;
    /// SR: transmit data register empty
    pub const TXE: u32 = 1 << 7;

    /// CR1: receiver enable
    pub const RE: u32 = 1 << 2;
    /// CR1: transmitter enable
    pub const TE: u32 = 1 << 3;
    /// CR1: parity control enable
    pub const PCE: u32 = 1 << 10;
    /// CR1: word length (0 = 8 data bits)
    pub const M: u32 = 1 << 12;
    /// CR1: USART enable
    pub const UE: u32 = 1 << 13;

    /// CR2: stop bits (00 = 1 stop bit)
    pub const STOP: u32 = 0b11 << 12;
}

/// USART/UART instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum UsartId {
    /// USART1 (APB2)
    Usart1,
    /// USART2 (APB1)
    Usart2,
    /// USART3 (APB1)
    Usart3,
    /// UART4 (APB1)
    Uart4,
    /// UART5 (APB1)
    Uart5,
    /// USART6 (APB2)
    Usart6,
}

impl UsartId {
    /// Register block base address
    #[must_use]
    pub const fn base(self) -> u32 {
        match self {
            Self::Usart1 => 0x4001_1000,
            Self::Usart2 => 0x4000_4400,
            Self::Usart3 => 0x4000_4800,
            Self::Uart4 => 0x4000_4C00,
            Self::Uart5 => 0x4000_5000,
            Self::Usart6 => 0x4001_1400,
        }
    }

    /// Peripheral identity for the clock-gate and interrupt tables
    #[must_use]
    pub const fn peripheral(self) -> Peripheral {
        Peripheral::Usart(self)
    }

    /// Clock of the APB bus the instance sits on
    #[must_use]
    pub const fn bus_clock_hz(self) -> u32 {
        match self {
            Self::Usart1 | Self::Usart6 => PCLK2_HZ,
            _ => PCLK1_HZ,
        }
    }
}

/// Baud-rate register value: `round(bus_clock / baud)`
///
/// Rounds to nearest rather than truncating, which halves the worst-case
/// bit-time error: 16 MHz / 115 200 = 138.9 gives 139. A zero baud gives
/// zero, which leaves the USART clock stopped.
#[must_use]
pub const fn baud_divisor(bus_clock_hz: u32, baud: u32) -> u32 {
    if baud == 0 {
        return 0;
    }
    ((bus_clock_hz as u64 + baud as u64 / 2) / baud as u64) as u32
}

/// Link parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct SerialConfig {
    /// USART instance
    pub usart: UsartId,
    /// Transmit pin
    pub tx: Pin,
    /// Receive pin
    pub rx: Pin,
    /// Alternate function routing both pins to the instance
    pub af: AltFunction,
    /// Clock feeding the instance
    pub bus_clock_hz: u32,
    /// Line rate
    pub baud: u32,
}

impl SerialConfig {
    /// USART2 on PA2/PA3 (the NUCLEO virtual COM port) at 115 200 baud
    pub const VCP: Self = Self {
        usart: UsartId::Usart2,
        tx: pins::USART2_TX,
        rx: pins::USART2_RX,
        af: pins::USART2_AF,
        bus_clock_hz: PCLK1_HZ,
        baud: DEFAULT_BAUD,
    };

    /// Same routing at a different line rate
    #[must_use]
    pub const fn with_baud(self, baud: u32) -> Self {
        Self { baud, ..self }
    }

    /// BRR value for this configuration
    #[must_use]
    pub const fn divisor(&self) -> u32 {
        baud_divisor(self.bus_clock_hz, self.baud)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::VCP
    }
}

/// Cut-off for a polled wait
pub trait Deadline {
    /// Called once per poll; `true` ends the wait
    fn expired(&mut self) -> bool;
}

/// Deadline measured in status-register polls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollBudget {
    remaining: u32,
}

impl PollBudget {
    /// Allow `polls` status reads before expiring
    #[must_use]
    pub const fn new(polls: u32) -> Self {
        Self { remaining: polls }
    }

    /// Polls left
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Default for PollBudget {
    /// Enough polls for one character at the default line rate
    fn default() -> Self {
        Self::new(SERIAL_POLL_BUDGET)
    }
}

impl Deadline for PollBudget {
    fn expired(&mut self) -> bool {
        if self.remaining == 0 {
            true
        } else {
            self.remaining -= 1;
            false
        }
    }
}

impl<F: FnMut() -> bool> Deadline for F {
    fn expired(&mut self) -> bool {
        self()
    }
}

/// Polled USART driver
pub struct Serial<'a, B: Mmio> {
    config: SerialConfig,
    regs: Block<'a, B>,
    rcc: ClockGate<'a, B>,
    gpio: Gpio<'a, B>,
}

impl<'a, B: Mmio> Serial<'a, B> {
    /// Bind to the instance named in `config`; call [`Serial::init`] before use
    #[must_use]
    pub const fn new(bus: &'a B, config: SerialConfig) -> Self {
        Self {
            config,
            regs: Block::new(bus, config.usart.base()),
            rcc: ClockGate::new(bus),
            gpio: Gpio::new(bus),
        }
    }

    /// Link parameters
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Bring the link up
    ///
    /// Gates the port and USART clocks, routes TX/RX, disables the USART,
    /// programs 8N1 and the rounded baud divisor, enables transmitter,
    /// receiver and USART, then reads SR and DR once to discard anything
    /// latched before software was ready.
    pub fn init(&mut self) -> Result<()> {
        let config = self.config;
        self.rcc.enable(Peripheral::Gpio(config.tx.port()))?;
        self.rcc.enable(Peripheral::Gpio(config.rx.port()))?;
        self.rcc.enable(config.usart.peripheral())?;

        self.gpio.set_alternate_function(config.tx, config.af);
        self.gpio.set_alternate_function(config.rx, config.af);

        self.regs.clear_bits(reg::CR1, bits::UE);
        self.regs.clear_bits(reg::CR1, bits::M | bits::PCE);
        self.regs.clear_bits(reg::CR2, bits::STOP);
        self.regs.write(reg::BRR, config.divisor());
        self.regs.set_bits(reg::CR1, bits::TE | bits::RE);
        self.regs.set_bits(reg::CR1, bits::UE);

        let _ = self.regs.read(reg::SR);
        let _ = self.regs.read(reg::DR);

        info!(
            "{} up at {} baud (BRR {})",
            config.usart,
            config.baud,
            config.divisor()
        );
        Ok(())
    }

    /// Whether DR can take another character
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.regs.is_set(reg::SR, bits::TXE)
    }

    /// Whether a received character is waiting in DR
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.regs.is_set(reg::SR, bits::RXNE)
    }

    /// Send one character, waiting for TXE without limit
    pub fn send(&mut self, byte: u8) {
        while !self.is_writable() {
            core::hint::spin_loop();
        }
        self.regs.write(reg::DR, u32::from(byte));
    }

    /// Receive one character, waiting for RXNE without limit
    pub fn receive(&mut self) -> u8 {
        while !self.is_readable() {
            core::hint::spin_loop();
        }
        self.read_data()
    }

    /// Send one character unless `deadline` expires first
    pub fn send_with_deadline(&mut self, byte: u8, deadline: &mut impl Deadline) -> Result<()> {
        while !self.is_writable() {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        self.regs.write(reg::DR, u32::from(byte));
        Ok(())
    }

    /// Receive one character unless `deadline` expires first
    pub fn receive_with_deadline(&mut self, deadline: &mut impl Deadline) -> Result<u8> {
        while !self.is_readable() {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        Ok(self.read_data())
    }

    /// Send every byte of `bytes`
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.send(byte);
        }
    }

    /// Send a string
    pub fn send_string(&mut self, s: &str) {
        self.send_bytes(s.as_bytes());
    }

    /// Clear an ANSI terminal and home the cursor
    pub fn clear_screen(&mut self) {
        self.send_string(CLEAR_SCREEN);
    }

    /// Wait until the last character has left the shift register
    pub fn flush(&mut self) {
        while !self.regs.is_set(reg::SR, bits::TC) {
            core::hint::spin_loop();
        }
    }

    /// Collect characters up to CR or LF
    ///
    /// The terminator is not stored. With `echo` each stored character is
    /// sent back. A line longer than `N` fails with [`Error::Overflow`]
    /// after the rest of it has been discarded.
    pub fn read_line<const N: usize>(&mut self, echo: bool) -> Result<heapless::Vec<u8, N>> {
        let mut line = heapless::Vec::new();
        let mut overflowed = false;
        loop {
            let byte = self.receive();
            if byte == b'\r' || byte == b'\n' {
                break;
            }
            if line.push(byte).is_err() {
                overflowed = true;
                continue;
            }
            if echo {
                self.send(byte);
            }
        }
        if overflowed {
            warn!("line longer than {} bytes dropped", N);
            return Err(Error::Overflow);
        }
        Ok(line)
    }

    fn read_data(&self) -> u8 {
        (self.regs.read(reg::DR) & 0xFF) as u8
    }
}

impl<B: Mmio> core::fmt::Write for Serial<'_, B> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.send_string(s);
        Ok(())
    }
}

impl<B: Mmio> embedded_io::ErrorType for Serial<'_, B> {
    type Error = Error;
}

impl<B: Mmio> embedded_io::Write for Serial<'_, B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.send_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Serial::flush(self);
        Ok(())
    }
}

impl<B: Mmio> embedded_io::Read for Serial<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.receive();
        let mut count = 1;
        for slot in rest {
            if !self.is_readable() {
                break;
            }
            *slot = self.read_data();
            count += 1;
        }
        Ok(count)
    }
}

impl<B: Mmio> embedded_io::ReadReady for Serial<'_, B> {
    fn read_ready(&mut self) -> Result<bool> {
        Ok(self.is_readable())
    }
}

impl<B: Mmio> embedded_io::WriteReady for Serial<'_, B> {
    fn write_ready(&mut self) -> Result<bool> {
        Ok(self.is_writable())
    }
}
