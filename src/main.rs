//! NUCLEO-F446RE Demo Application
//!
//! Blinks the status LED (PC8) from the SysTick exception, greets the
//! ST-LINK virtual COM port, drives LED2 (PB6) from TIM4 PWM and then echoes
//! everything typed at the terminal. Enter toggles LED1 (PC5).

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::fmt::Write as _;

use cortex_m_rt::{entry, exception};
use critical_section::Mutex;
use defmt::info;
use {defmt_rtt as _, panic_probe as _};

use bare_f446re::hal::systick;
use bare_f446re::prelude::*;

static BUS: Device = Device;

/// Status LED, owned by the SysTick exception once the blink starts
static STATUS_LED: Mutex<RefCell<Option<Output<'static, Device>>>> = Mutex::new(RefCell::new(None));

/// Main entry point
#[entry]
fn main() -> ! {
    info!("bare-f446re demo v{}", env!("CARGO_PKG_VERSION"));

    let gpio = Gpio::new(&BUS);

    // Status LED on, then hand it to the exception before the tick starts
    let status = gpio.output(pins::LED_STATUS, Level::High);
    critical_section::with(|cs| {
        STATUS_LED.borrow_ref_mut(cs).replace(status);
    });

    let reload = systick::reload_for(SYSTEM_CLOCK_HZ, STATUS_BLINK_HZ);
    systick::SysTick::new(&BUS).configure(reload, ClockSource::Processor, true);
    info!(
        "status LED toggling at {} Hz",
        systick::rate_hz(SYSTEM_CLOCK_HZ, reload)
    );

    let mut serial = Serial::new(&BUS, SerialConfig::VCP);
    defmt::unwrap!(serial.init());
    serial.clear_screen();
    serial.send_string("\r\n>> Press any key to start...\r\n");
    let _ = serial.receive();
    serial.send_string("Hello, World!\r\n");

    let mut led1 = gpio.output(pins::LED1, Level::Low);

    gpio.set_alternate_function(pins::LED2, pins::LED2_AF);
    let mut led2 = Timer::new(&BUS, TimerId::Tim4);
    defmt::unwrap!(led2.enable_pwm());
    led2.set_duty(LED2_DEFAULT_DUTY);
    let _ = write!(serial, "LED2 at {}% duty\r\n> ", led2.duty_cycle().as_percent());

    info!("entering echo loop");
    loop {
        let byte = serial.receive();
        serial.send(byte);
        if byte == b'\r' {
            serial.send_string("\n> ");
            led1.toggle();
        }
    }
}

/// SysTick exception: blink the status LED
#[exception]
fn SysTick() {
    critical_section::with(|cs| {
        if let Some(led) = STATUS_LED.borrow_ref_mut(cs).as_mut() {
            led.toggle();
        }
    });
}
