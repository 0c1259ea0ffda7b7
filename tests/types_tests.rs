//! Types Module Tests
//!
//! Tests for pin identities and the GPIO setting encodings.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test types_tests

use bare_f446re::types::{AltFunction, Level, Mode, OutputType, Pin, PinConfig, Port, Pull, Speed};

// =============================================================================
// Port Tests
// =============================================================================

#[test]
fn test_port_index_order() {
    for (i, port) in Port::ALL.iter().enumerate() {
        assert_eq!(usize::from(port.index()), i);
    }
}

#[test]
fn test_port_letters() {
    assert_eq!(Port::A.letter(), 'A');
    assert_eq!(Port::H.letter(), 'H');
}

// =============================================================================
// Pin Tests
// =============================================================================

#[test]
fn test_pin_new_valid() {
    assert!(Pin::new(Port::A, 0).is_some());
    assert!(Pin::new(Port::C, 15).is_some());
    assert!(Port::B.pin(6).is_some());
}

#[test]
fn test_pin_new_invalid() {
    assert!(Pin::new(Port::A, 16).is_none());
    assert!(Pin::new(Port::H, 255).is_none());
}

#[test]
fn test_pin_mask() {
    assert_eq!(Pin::new(Port::C, 8).unwrap().mask(), 1 << 8);
    assert_eq!(Pin::new(Port::A, 15).unwrap().mask(), 1 << 15);
}

#[test]
fn test_pin_parse() {
    let pin = Pin::parse("PC8").unwrap();
    assert_eq!(pin.port(), Port::C);
    assert_eq!(pin.index(), 8);

    assert_eq!(Pin::parse("pa15"), Pin::new(Port::A, 15));
}

#[test]
fn test_pin_parse_rejects() {
    assert!(Pin::parse("PC16").is_none());
    assert!(Pin::parse("PI0").is_none());
    assert!(Pin::parse("C8").is_none());
    assert!(Pin::parse("P").is_none());
    assert!(Pin::parse("PB-1").is_none());
}

#[test]
fn test_pin_parse_exact_digits() {
    assert!(Pin::parse("PC+8").is_none());
    assert!(Pin::parse("PC008").is_none());
    assert!(Pin::parse("PC08").is_none());
    assert!(Pin::parse("PC 8").is_none());
    assert_eq!(Pin::parse("PA0"), Pin::new(Port::A, 0));
    assert_eq!(Pin::parse("PB10"), Pin::new(Port::B, 10));
}

#[test]
fn test_pin_display() {
    let pin = Pin::new(Port::B, 6).unwrap();
    assert_eq!(format!("{pin}"), "PB6");
    assert_eq!(format!("{pin:?}"), "PB6");
}

// =============================================================================
// Level Tests
// =============================================================================

#[test]
fn test_level_toggle() {
    assert_eq!(Level::Low.toggle(), Level::High);
    assert_eq!(Level::High.toggle().toggle(), Level::High);
}

#[test]
fn test_level_from_bool() {
    assert_eq!(Level::from(true), Level::High);
    assert_eq!(Level::from_bit(false), Level::Low);
    assert!(Level::High.is_high());
}

// =============================================================================
// Register Encoding Tests
// =============================================================================

#[test]
fn test_mode_encoding() {
    for mode in [Mode::Input, Mode::Output, Mode::AlternateFunction, Mode::Analog] {
        assert_eq!(Mode::from_bits(mode.bits()), mode);
    }
    assert_eq!(Mode::AlternateFunction.bits(), 0b10);
}

#[test]
fn test_output_type_encoding() {
    assert_eq!(OutputType::PushPull.bits(), 0);
    assert_eq!(OutputType::OpenDrain.bits(), 1);
    assert_eq!(OutputType::from_bits(1), OutputType::OpenDrain);
}

#[test]
fn test_speed_encoding() {
    assert_eq!(Speed::Low.bits(), 0b00);
    assert_eq!(Speed::High.bits(), 0b11);
    assert_eq!(Speed::from_bits(0b10), Speed::Fast);
}

#[test]
fn test_pull_reserved_reads_as_none() {
    assert_eq!(Pull::Down.bits(), 0b10);
    assert_eq!(Pull::from_bits(0b11), Pull::None);
}

#[test]
fn test_alt_function_range() {
    assert_eq!(AltFunction::new(7), Some(AltFunction::AF7));
    assert_eq!(AltFunction::new(15).map(AltFunction::index), Some(15));
    assert!(AltFunction::new(16).is_none());
}

#[test]
fn test_pin_config_presets() {
    let af = PinConfig::alternate(AltFunction::AF2);
    assert_eq!(af.mode, Mode::AlternateFunction);
    assert_eq!(af.speed, Speed::High);
    assert_eq!(af.alternate.index(), 2);

    assert_eq!(PinConfig::output().mode, Mode::Output);
    assert_eq!(PinConfig::input(Pull::Up).pull, Pull::Up);
    assert_eq!(PinConfig::default().mode, Mode::Input);
}
