//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use bare_f446re::config::*;
use bare_f446re::hal::serial::{SerialConfig, UsartId};
use bare_f446re::hal::systick::RELOAD_MAX;
use bare_f446re::hal::timer::Timing;
use bare_f446re::types::{AltFunction, Port};

// =============================================================================
// Clock Tests
// =============================================================================

#[test]
fn system_clock_is_hsi() {
    // No PLL: SYSCLK runs from the 16 MHz internal oscillator
    assert_eq!(SYSTEM_CLOCK_HZ, 16_000_000);
}

#[test]
fn apb_clocks_undivided() {
    assert_eq!(PCLK1_HZ, SYSTEM_CLOCK_HZ);
    assert_eq!(PCLK2_HZ, SYSTEM_CLOCK_HZ);
}

// =============================================================================
// Timer Defaults Tests
// =============================================================================

#[test]
fn timer_prescaler_gives_1khz() {
    assert_eq!(PCLK1_HZ / (TIMER_1KHZ_PRESCALER + 1), 1_000);
}

#[test]
fn timer_period_is_one_second() {
    assert_eq!(Timing::DEFAULT.period_us(PCLK1_HZ), 1_000_000);
}

#[test]
fn prescaler_fits_psc() {
    assert!(TIMER_1KHZ_PRESCALER <= u32::from(u16::MAX));
}

// =============================================================================
// SysTick Defaults Tests
// =============================================================================

#[test]
fn systick_one_second_is_one_clock_count() {
    assert_eq!(SYSTICK_1SEC_RELOAD, SYSTEM_CLOCK_HZ);
}

#[test]
fn blink_reload_fits_counter() {
    assert!(SYSTICK_1SEC_RELOAD / STATUS_BLINK_HZ <= RELOAD_MAX);
}

// =============================================================================
// Serial Defaults Tests
// =============================================================================

#[test]
fn default_baud() {
    assert_eq!(DEFAULT_BAUD, 115_200);
}

#[test]
fn vcp_config_matches_board() {
    let config = SerialConfig::default();
    assert_eq!(config.usart, UsartId::Usart2);
    assert_eq!(config.tx, pins::USART2_TX);
    assert_eq!(config.rx, pins::USART2_RX);
    assert_eq!(config.af, AltFunction::AF7);
    assert_eq!(config.baud, DEFAULT_BAUD);
    assert_eq!(config.bus_clock_hz, PCLK1_HZ);
}

#[test]
fn poll_budget_covers_one_character() {
    // One 10-bit frame at 115 200 baud is ~1 389 processor clocks
    let frame_clocks = SYSTEM_CLOCK_HZ / DEFAULT_BAUD * 10;
    assert!(SERIAL_POLL_BUDGET > frame_clocks);
}

#[test]
fn clear_screen_is_ansi() {
    assert!(CLEAR_SCREEN.starts_with('\x1b'));
    assert!(CLEAR_SCREEN.ends_with('H'));
}

// =============================================================================
// Pin Assignment Tests
// =============================================================================

#[test]
fn board_pins() {
    assert_eq!(pins::LED_STATUS.port(), Port::C);
    assert_eq!(pins::LED_STATUS.index(), 8);
    assert_eq!(pins::LED1.index(), 5);
    assert_eq!((pins::LED2.port(), pins::LED2.index()), (Port::B, 6));
    assert_eq!((pins::USART2_TX.port(), pins::USART2_TX.index()), (Port::A, 2));
    assert_eq!(pins::USART2_RX.index(), 3);
}

#[test]
fn led2_routes_to_tim4() {
    assert_eq!(pins::LED2_AF, AltFunction::AF2);
}

#[test]
fn pins_are_distinct() {
    let all = [
        pins::LED_STATUS,
        pins::LED1,
        pins::LED2,
        pins::USART2_TX,
        pins::USART2_RX,
    ];
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn default_led2_duty_in_range() {
    assert!(LED2_DEFAULT_DUTY <= 100);
}
