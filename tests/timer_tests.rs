//! Timer Controller Tests
//!
//! Tests for the TIM2–TIM5 lifecycle, update-event handling and PWM duty
//! cycle mapping, against the host register model.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test timer_tests

use bare_f446re::hal::nvic::NVIC_BASE;
use bare_f446re::hal::pwm::DutyCycle;
use bare_f446re::hal::rcc::RCC_BASE;
use bare_f446re::hal::timer::{Timer, TimerId, TimerState, Timing};
use bare_f446re::sim::SimBus;
use embedded_hal::pwm::SetDutyCycle;

const APB1ENR: u32 = RCC_BASE + 0x40;
const ISER0: u32 = NVIC_BASE;
const ICER0: u32 = NVIC_BASE + 0x80;

const CR1: u32 = 0x00;
const DIER: u32 = 0x0C;
const SR: u32 = 0x10;
const CCMR1: u32 = 0x18;
const CCER: u32 = 0x20;
const PSC: u32 = 0x28;
const ARR: u32 = 0x2C;
const CCR1: u32 = 0x34;

fn reg(id: TimerId, offset: u32) -> u32 {
    id.base() + offset
}

fn position(log: &[(u32, u32)], f: impl Fn(&(u32, u32)) -> bool) -> usize {
    log.iter().position(f).unwrap()
}

// =============================================================================
// Timing Tests
// =============================================================================

#[test]
fn default_timing_registers() {
    assert_eq!(Timing::DEFAULT, Timing::new(15, 999));
    assert_eq!(Timing::default().update_hz(16_000_000), 1);
}

#[test]
fn timing_arithmetic() {
    let timing = Timing::new(159, 99);
    assert_eq!(timing.tick_hz(16_000_000), 100_000);
    assert_eq!(timing.period_ticks(), 100);
    assert_eq!(timing.period_us(16_000_000), 1_000);
    assert_eq!(timing.update_hz(16_000_000), 1_000);
}

#[test]
fn set_timing_caps_sixteen_bit_counters() {
    let bus = SimBus::new();
    let mut tim3 = Timer::new(&bus, TimerId::Tim3);
    tim3.set_timing(Timing::new(0, 100_000));
    assert_eq!(tim3.timing().auto_reload, 0xFFFF);

    let mut tim5 = Timer::new(&bus, TimerId::Tim5);
    tim5.set_timing(Timing::new(0, 100_000));
    assert_eq!(tim5.timing().auto_reload, 100_000);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn new_timer_is_stopped() {
    let bus = SimBus::new();
    let timer = Timer::new(&bus, TimerId::Tim2);
    assert_eq!(timer.state(), TimerState::Stopped);
    assert_eq!(timer.id(), TimerId::Tim2);
}

#[test]
fn configure_without_clock_is_dropped() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);

    timer.configure();

    assert_eq!(bus.peek(reg(TimerId::Tim2, PSC)), 0);
    assert_eq!(bus.dropped_writes().len(), 2);
}

#[test]
fn start_programs_and_runs() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);

    timer.start().unwrap();

    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(bus.peek(reg(TimerId::Tim2, PSC)), 15);
    assert_eq!(bus.peek(reg(TimerId::Tim2, ARR)), 999);
    assert_eq!(bus.peek(reg(TimerId::Tim2, DIER)) & 1, 1);
    assert_eq!(bus.peek(reg(TimerId::Tim2, CR1)) & 1, 1);
    assert_eq!(bus.peek(ISER0), 1 << 28);
    assert!(bus.dropped_writes().is_empty());
}

#[test]
fn start_clears_the_forced_update() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim3);

    timer.start().unwrap();

    assert_eq!(bus.peek(reg(TimerId::Tim3, SR)) & 1, 0);
    assert!(!timer.take_update());
}

#[test]
fn start_orders_clock_interrupt_counter() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);
    let cr1 = reg(TimerId::Tim4, CR1);

    timer.start().unwrap();

    let log = bus.write_log();
    let clock = position(&log, |&(addr, _)| addr == APB1ENR);
    let first_timer_write = position(&log, |&(addr, _)| {
        (TimerId::Tim4.base()..TimerId::Tim4.base() + 0x400).contains(&addr)
    });
    let unmask = position(&log, |&(addr, _)| addr == ISER0);
    let run = position(&log, |&(addr, value)| addr == cr1 && value & 1 != 0);

    assert!(clock < first_timer_write);
    assert!(unmask < run);
}

#[test]
fn start_uses_configured_timing() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim5);
    timer.set_timing(Timing::new(1_599, 9));

    timer.start().unwrap();

    assert_eq!(bus.peek(reg(TimerId::Tim5, PSC)), 1_599);
    assert_eq!(bus.peek(reg(TimerId::Tim5, ARR)), 9);
    assert_eq!(bus.peek(ISER0 + 4), 1 << 18);
}

#[test]
fn stop_reverses_start() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);

    timer.start().unwrap();
    timer.stop().unwrap();

    assert_eq!(timer.state(), TimerState::Stopped);
    assert_eq!(bus.peek(reg(TimerId::Tim2, CR1)) & 1, 0);
    assert_eq!(bus.writes_to(ICER0), vec![1 << 28]);
    assert_eq!(bus.peek(ISER0), 0);
    assert_eq!(bus.peek(APB1ENR) & 1, 0);
}

#[test]
fn stop_disables_counter_before_cutting_clock() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);

    timer.start().unwrap();
    bus.clear_log();
    timer.stop().unwrap();

    assert!(bus.dropped_writes().is_empty());
    let log = bus.write_log();
    let halt = position(&log, |&(addr, _)| addr == reg(TimerId::Tim2, CR1));
    let mask = position(&log, |&(addr, _)| addr == ICER0);
    let gate = position(&log, |&(addr, _)| addr == APB1ENR);
    assert!(halt < mask && mask < gate);
}

#[test]
fn restart_after_stop() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim3);

    timer.start().unwrap();
    timer.stop().unwrap();
    timer.start().unwrap();

    assert_eq!(timer.state(), TimerState::Running);
    assert_eq!(bus.peek(reg(TimerId::Tim3, CR1)) & 1, 1);
}

#[test]
fn take_update_acknowledges_once() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);
    timer.start().unwrap();

    bus.raise_update(TimerId::Tim2);
    assert!(timer.take_update());
    assert!(!timer.take_update());
    assert_eq!(bus.peek(reg(TimerId::Tim2, SR)), 0);
}

// =============================================================================
// PWM Tests
// =============================================================================

#[test]
fn enable_pwm_sets_mode_one_with_preload() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);

    timer.enable_pwm().unwrap();

    assert_eq!(bus.peek(reg(TimerId::Tim4, CCMR1)), (0b110 << 4) | (1 << 3));
    assert_eq!(bus.peek(reg(TimerId::Tim4, CCER)), 1);
    assert_eq!(bus.peek(reg(TimerId::Tim4, CR1)), (1 << 7) | 1);
    assert_eq!(bus.peek(reg(TimerId::Tim4, CCR1)), 0);
    assert_eq!(bus.peek(reg(TimerId::Tim4, ARR)), 999);
    assert_eq!(timer.duty_cycle(), DutyCycle::ZERO);
}

#[test]
fn enable_pwm_leaves_interrupt_masked() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);

    timer.enable_pwm().unwrap();

    assert_eq!(bus.peek(reg(TimerId::Tim4, DIER)), 0);
    assert_eq!(bus.peek(ISER0), 0);
}

#[test]
fn set_duty_maps_percent_to_compare() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);
    timer.enable_pwm().unwrap();
    let ccr1 = reg(TimerId::Tim4, CCR1);

    timer.set_duty(0);
    assert_eq!(bus.peek(ccr1), 0);

    timer.set_duty(100);
    assert_eq!(bus.peek(ccr1), 999);

    timer.set_duty(50);
    assert_eq!(bus.peek(ccr1), 499);

    timer.set_duty(150);
    assert_eq!(bus.peek(ccr1), 999);
}

#[test]
fn set_duty_follows_auto_reload() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim3);
    timer.set_timing(Timing::new(0, 1_000));
    timer.enable_pwm().unwrap();

    timer.set_duty(25);
    assert_eq!(timer.compare(), 250);
    assert_eq!(timer.duty_cycle().as_percent(), 25);
}

#[test]
fn set_compare_is_limited_to_auto_reload() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);
    timer.enable_pwm().unwrap();

    timer.set_compare(5_000);
    assert_eq!(timer.compare(), 999);
    assert_eq!(timer.duty_cycle(), DutyCycle::FULL);
}

#[test]
fn pwm_channel_uses_auto_reload_as_max() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim4);
    timer.enable_pwm().unwrap();

    let mut channel = timer.pwm_channel();
    assert_eq!(channel.max_duty_cycle(), 999);
    channel.set_duty_cycle(333).unwrap();
    channel.set_duty_cycle_fully_on().unwrap();
    assert_eq!(channel.percent(), 100);
    channel.set_percent(10);
    assert_eq!(timer.compare(), 99);
}

#[test]
fn pwm_channel_scales_wide_counters() {
    let bus = SimBus::new();
    let mut timer = Timer::new(&bus, TimerId::Tim2);
    timer.set_timing(Timing::new(0, 131_071));
    timer.enable_pwm().unwrap();

    let mut channel = timer.pwm_channel();
    assert_eq!(channel.max_duty_cycle(), u16::MAX);
    channel.set_duty_cycle(u16::MAX).unwrap();
    assert_eq!(timer.compare(), 131_071);
}
