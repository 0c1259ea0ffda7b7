//! System configuration and hardware constants
//!
//! Compile-time constants for the NUCLEO-F446RE board running from the
//! 16 MHz internal oscillator (no PLL). All clock frequencies, default
//! peripheral timing and pin assignments are centralized here.

use crate::types::{AltFunction, Pin, Port};

/// HSI oscillator frequency; SYSCLK, HCLK and PCLK1 all run from it at reset
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// APB1 peripheral clock (USART2..5, TIM2..5 input clock)
pub const PCLK1_HZ: u32 = SYSTEM_CLOCK_HZ;

/// APB2 peripheral clock (USART1, USART6)
pub const PCLK2_HZ: u32 = SYSTEM_CLOCK_HZ;

/// Terminal baud rate (8N1)
pub const DEFAULT_BAUD: u32 = 115_200;

/// Timer prescaler for a 1 kHz tick from a 16 MHz input clock
pub const TIMER_1KHZ_PRESCALER: u32 = 15;

/// Timer auto-reload for a 1 second period at a 1 kHz tick
pub const TIMER_1SEC_ARR: u32 = 999;

/// SysTick reload for a 1 second period at 16 MHz
pub const SYSTICK_1SEC_RELOAD: u32 = 16_000_000;

/// Status LED blink rate driven by the SysTick exception
pub const STATUS_BLINK_HZ: u32 = 12;

/// Register polls a deadline-bounded serial transfer waits before giving up.
/// At 115200 baud one character takes ~87 µs, several hundred polls at 16 MHz.
pub const SERIAL_POLL_BUDGET: u32 = 100_000;

/// Duty cycle the demo starts LED2 at
pub const LED2_DEFAULT_DUTY: u8 = 50;

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Pin assignments for the NUCLEO-F446RE
pub mod pins {
    //! GPIO pin assignments matching the board wiring

    use super::{AltFunction, Pin, Port};

    /// Status LED, blinked from the SysTick exception
    pub const LED_STATUS: Pin = pin(Port::C, 8);

    /// LED1, plain push-pull output
    pub const LED1: Pin = pin(Port::C, 5);

    /// LED2, driven by TIM4 channel 1
    pub const LED2: Pin = pin(Port::B, 6);

    /// Alternate function routing TIM4_CH1 to PB6
    pub const LED2_AF: AltFunction = AltFunction::AF2;

    /// USART2 TX (ST-LINK virtual COM port)
    pub const USART2_TX: Pin = pin(Port::A, 2);

    /// USART2 RX (ST-LINK virtual COM port)
    pub const USART2_RX: Pin = pin(Port::A, 3);

    /// Alternate function routing USART2 to PA2/PA3
    pub const USART2_AF: AltFunction = AltFunction::AF7;

    const fn pin(port: Port, index: u8) -> Pin {
        match Pin::new(port, index) {
            Some(pin) => pin,
            None => panic!("pin index out of range"),
        }
    }
}
