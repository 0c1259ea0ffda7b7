//! STM32F446RE Bare-Metal Drivers
//!
//! Register-level drivers for the STM32F446RE (NUCLEO-F446RE board) running
//! from the 16 MHz internal oscillator: peripheral clock gating, GPIO,
//! the general-purpose timers TIM2–TIM5 with PWM on channel 1, the
//! Cortex-M SysTick timer and a polled USART.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DEMO APPLICATION                         │
//! │  SysTick blink  │  PWM LED  │  Serial echo                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                         DRIVERS                              │
//! │  GPIO  │  Timer / PWM  │  SysTick  │  Serial                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    CLOCK & INTERRUPTS                        │
//! │        RCC clock gates        │        NVIC lines            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      REGISTER BUS                            │
//! │  Device (volatile MMIO)   │   SimBus (host register model)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **One unsafe seam**: all register access goes through [`hal::Mmio`]
//! - **Tables over comparison chains**: clock gates and interrupt lines are
//!   looked up in static tables; unknown identities are errors
//! - **Field-scoped writes**: configuration touches only the addressed field
//! - **Host-testable**: the drivers are generic over the bus and run against
//!   [`sim::SimBus`] with the `std` feature

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// Clock gates, interrupt lines and the peripheral drivers.
pub mod hal;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Host register model
///
/// Stands in for the microcontroller in integration tests.
#[cfg(feature = "std")]
pub mod sim;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::hal::gpio::{Gpio, Input, Output};
    pub use crate::hal::pwm::DutyCycle;
    pub use crate::hal::rcc::ClockGate;
    pub use crate::hal::serial::{Deadline, PollBudget, Serial, SerialConfig, UsartId};
    pub use crate::hal::systick::{ClockSource, SysTick};
    pub use crate::hal::timer::{Timer, TimerId, Timing};
    pub use crate::hal::{Device, Error, Mmio, Peripheral};

    // Common traits
    pub use embedded_hal::digital::{OutputPin, StatefulOutputPin};
    pub use embedded_hal::pwm::SetDutyCycle;

    // Error handling
    pub use core::result::Result;
}
