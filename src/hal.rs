//! Hardware Abstraction Layer
//!
//! Register-level drivers for the STM32F446RE. Every driver follows the same
//! sequence: gate the peripheral clock on, configure bitfields, then enable
//! interrupts or counters. Register blocks are reached through the
//! [`mmio::Mmio`] seam so the same code runs on target and against the host
//! register model.

use core::fmt;

pub mod gpio;
pub mod mmio;
pub mod nvic;
pub mod pwm;
pub mod rcc;
pub mod serial;
pub mod systick;
pub mod timer;

pub use mmio::{Device, Mmio};
pub use rcc::Peripheral;

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The peripheral has no entry in the clock-gate or interrupt table
    Unsupported(Peripheral),
    /// A deadline expired before the hardware became ready
    Timeout,
    /// Received data did not fit the caller's buffer
    Overflow,
}

/// Driver operation result
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(p) => write!(f, "{p:?} has no clock gate or interrupt line"),
            Self::Timeout => f.write_str("timed out waiting for the peripheral"),
            Self::Overflow => f.write_str("receive buffer overflow"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Unsupported(p) => defmt::write!(f, "Unsupported({})", p),
            Self::Timeout => defmt::write!(f, "Timeout"),
            Self::Overflow => defmt::write!(f, "Overflow"),
        }
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::Unsupported(_) => embedded_io::ErrorKind::Unsupported,
            Self::Timeout => embedded_io::ErrorKind::TimedOut,
            Self::Overflow => embedded_io::ErrorKind::OutOfMemory,
        }
    }
}
