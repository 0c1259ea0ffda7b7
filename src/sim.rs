//! Host register model
//!
//! [`SimBus`] implements [`Mmio`] over an in-memory register file and models
//! the hardware behavior the drivers depend on:
//!
//! - accesses to a peripheral whose RCC gate is off are dropped (reads
//!   return zero, writes are recorded as dropped)
//! - GPIO BSRR updates ODR and reads as zero; IDR follows ODR on output
//!   pins and the injected pad level elsewhere
//! - NVIC ISER/ICER set and clear one shared enable bank
//! - timer SR is clear-on-write-zero; EGR.UG raises UIF and reads as zero
//! - USART SR reports TXE/TC always and RXNE while received bytes are
//!   queued; DR writes are captured only with UE and TE set
//! - SysTick CVR clears on any write; reading CSR clears COUNTFLAG
//!
//! Every accepted write is appended to a log so tests can check ordering.

extern crate std;

use core::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use crate::hal::gpio::port_base;
use crate::hal::mmio::Mmio;
use crate::hal::nvic::NVIC_BASE;
use crate::hal::rcc::{Peripheral, CLOCK_GATES, RCC_BASE};
use crate::hal::serial::UsartId;
use crate::hal::systick::{RELOAD_MAX, SYSTICK_BASE};
use crate::hal::timer::TimerId;
use crate::types::{Level, Pin, Port};

const BLOCK_SIZE: u32 = 0x400;

const GPIO_MODER: u32 = 0x00;
const GPIO_IDR: u32 = 0x10;
const GPIO_ODR: u32 = 0x14;
const GPIO_BSRR: u32 = 0x18;

const TIM_SR: u32 = 0x10;
const TIM_EGR: u32 = 0x14;
const TIM_UIF: u32 = 1;

const USART_SR: u32 = 0x00;
const USART_DR: u32 = 0x04;
const USART_CR1: u32 = 0x0C;
const USART_RXNE: u32 = 1 << 5;
const USART_TC: u32 = 1 << 6;
const USART_TXE: u32 = 1 << 7;
const USART_RE: u32 = 1 << 2;
const USART_TE: u32 = 1 << 3;
const USART_UE: u32 = 1 << 13;

const NVIC_ICER: u32 = 0x80;

const SYST_CSR: u32 = SYSTICK_BASE;
const SYST_RVR: u32 = SYSTICK_BASE + 0x04;
const SYST_CVR: u32 = SYSTICK_BASE + 0x08;
const SYST_ENABLE: u32 = 1;
const SYST_COUNTFLAG: u32 = 1 << 16;

/// Base address of a gated peripheral's register block
const fn block_base(peripheral: Peripheral) -> Option<u32> {
    match peripheral {
        Peripheral::Gpio(port) => Some(port_base(port)),
        Peripheral::Timer(id) => Some(id.base()),
        Peripheral::Usart(id) => Some(id.base()),
        Peripheral::SysTick => None,
    }
}

/// Gated peripheral whose register block contains `addr`
fn owner(addr: u32) -> Option<(Peripheral, u32)> {
    CLOCK_GATES.iter().find_map(|&(peripheral, _)| {
        let base = block_base(peripheral)?;
        (base..base + BLOCK_SIZE)
            .contains(&addr)
            .then_some((peripheral, base))
    })
}

#[derive(Default)]
struct State {
    regs: BTreeMap<u32, u32>,
    pads: BTreeMap<Port, u32>,
    rx: BTreeMap<UsartId, VecDeque<u8>>,
    tx: BTreeMap<UsartId, Vec<u8>>,
    writes: Vec<(u32, u32)>,
    dropped: Vec<(u32, u32)>,
}

impl State {
    fn get(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    fn set(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
    }

    fn is_clocked(&self, peripheral: Peripheral) -> bool {
        CLOCK_GATES
            .iter()
            .find(|(p, _)| *p == peripheral)
            .is_some_and(|(_, gate)| self.get(RCC_BASE + gate.bus.enable_register()) & gate.mask() != 0)
    }

    fn read(&mut self, addr: u32) -> u32 {
        if let Some((peripheral, base)) = owner(addr) {
            if !self.is_clocked(peripheral) {
                return 0;
            }
            let offset = addr - base;
            return match peripheral {
                Peripheral::Gpio(port) => self.read_gpio(port, base, offset),
                Peripheral::Timer(_) if offset == TIM_EGR => 0,
                Peripheral::Usart(id) => self.read_usart(id, base, offset),
                _ => self.get(addr),
            };
        }
        if (NVIC_BASE..NVIC_BASE + 2 * NVIC_ICER).contains(&addr) {
            return self.get(NVIC_BASE + (addr - NVIC_BASE) % NVIC_ICER);
        }
        if addr == SYST_CSR {
            let csr = self.get(addr);
            self.set(addr, csr & !SYST_COUNTFLAG);
            return csr;
        }
        self.get(addr)
    }

    fn write(&mut self, addr: u32, value: u32) {
        if let Some((peripheral, base)) = owner(addr) {
            if !self.is_clocked(peripheral) {
                self.dropped.push((addr, value));
                return;
            }
            self.writes.push((addr, value));
            let offset = addr - base;
            match peripheral {
                Peripheral::Gpio(_) if offset == GPIO_BSRR => {
                    let odr = self.get(base + GPIO_ODR);
                    let set = value & 0xFFFF;
                    let reset = value >> 16;
                    self.set(base + GPIO_ODR, (odr & !reset) | set);
                }
                Peripheral::Gpio(_) if offset == GPIO_IDR => {}
                Peripheral::Timer(_) if offset == TIM_SR => {
                    let sr = self.get(addr);
                    self.set(addr, sr & value);
                }
                Peripheral::Timer(_) if offset == TIM_EGR => {
                    if value & TIM_UIF != 0 {
                        let sr = self.get(base + TIM_SR);
                        self.set(base + TIM_SR, sr | TIM_UIF);
                    }
                }
                Peripheral::Usart(id) if offset == USART_DR => {
                    let cr1 = self.get(base + USART_CR1);
                    if cr1 & (USART_UE | USART_TE) == USART_UE | USART_TE {
                        self.tx.entry(id).or_default().push((value & 0xFF) as u8);
                    }
                }
                Peripheral::Usart(_) if offset == USART_SR => {}
                _ => self.set(addr, value),
            }
            return;
        }

        self.writes.push((addr, value));
        if (NVIC_BASE..NVIC_BASE + NVIC_ICER).contains(&addr) {
            let enabled = self.get(addr);
            self.set(addr, enabled | value);
        } else if (NVIC_BASE + NVIC_ICER..NVIC_BASE + 2 * NVIC_ICER).contains(&addr) {
            let bank = addr - NVIC_ICER;
            let enabled = self.get(bank);
            self.set(bank, enabled & !value);
        } else if addr == SYST_CVR {
            self.set(addr, 0);
            let csr = self.get(SYST_CSR);
            self.set(SYST_CSR, csr & !SYST_COUNTFLAG);
        } else if addr == SYST_CSR {
            // COUNTFLAG is read-only
            let flag = self.get(SYST_CSR) & SYST_COUNTFLAG;
            self.set(addr, (value & !SYST_COUNTFLAG) | flag);
        } else {
            self.set(addr, value);
        }
    }

    fn read_gpio(&self, port: Port, base: u32, offset: u32) -> u32 {
        if offset == GPIO_BSRR {
            return 0;
        }
        if offset != GPIO_IDR {
            return self.get(base + offset);
        }
        let moder = self.get(base + GPIO_MODER);
        let outputs = (0..16u32)
            .filter(|n| (moder >> (2 * n)) & 0b11 == 0b01)
            .fold(0u32, |mask, n| mask | (1 << n));
        let pads = self.pads.get(&port).copied().unwrap_or(0);
        (self.get(base + GPIO_ODR) & outputs) | (pads & !outputs)
    }

    fn read_usart(&mut self, id: UsartId, base: u32, offset: u32) -> u32 {
        let cr1 = self.get(base + USART_CR1);
        let receiving = cr1 & (USART_UE | USART_RE) == USART_UE | USART_RE;
        match offset {
            USART_SR => {
                let pending = receiving && self.rx.get(&id).is_some_and(|q| !q.is_empty());
                USART_TXE | USART_TC | if pending { USART_RXNE } else { 0 }
            }
            USART_DR => {
                if !receiving {
                    return 0;
                }
                self.rx
                    .get_mut(&id)
                    .and_then(VecDeque::pop_front)
                    .map_or(0, u32::from)
            }
            _ => self.get(base + offset),
        }
    }
}

/// In-memory register file with peripheral side effects
#[derive(Default)]
pub struct SimBus {
    state: RefCell<State>,
}

impl SimBus {
    /// Model with every register at zero: all clocks gated off
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored register value, bypassing read side effects and clock gating
    #[must_use]
    pub fn peek(&self, addr: u32) -> u32 {
        self.state.borrow().get(addr)
    }

    /// Store a register value directly, bypassing write side effects
    pub fn poke(&self, addr: u32, value: u32) {
        self.state.borrow_mut().set(addr, value);
    }

    /// Drive a pad from outside the chip
    pub fn set_input(&self, pin: Pin, level: Level) {
        let mut state = self.state.borrow_mut();
        let pads = state.pads.entry(pin.port()).or_default();
        match level {
            Level::High => *pads |= pin.mask(),
            Level::Low => *pads &= !pin.mask(),
        }
    }

    /// Queue bytes arriving on a USART's RX line
    pub fn push_rx(&self, usart: UsartId, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .rx
            .entry(usart)
            .or_default()
            .extend(bytes.iter().copied());
    }

    /// Bytes still waiting to be read from a USART
    #[must_use]
    pub fn rx_pending(&self, usart: UsartId) -> usize {
        self.state.borrow().rx.get(&usart).map_or(0, VecDeque::len)
    }

    /// Bytes a USART has transmitted so far
    #[must_use]
    pub fn tx_log(&self, usart: UsartId) -> Vec<u8> {
        self.state.borrow().tx.get(&usart).cloned().unwrap_or_default()
    }

    /// Raise a timer's update event, as an overflow would
    pub fn raise_update(&self, timer: TimerId) {
        let addr = timer.base() + TIM_SR;
        let mut state = self.state.borrow_mut();
        let sr = state.get(addr);
        state.set(addr, sr | TIM_UIF);
    }

    /// Run the SysTick counter for `clocks` cycles; returns the number of wraps
    pub fn advance_systick(&self, clocks: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        if state.get(SYST_CSR) & SYST_ENABLE == 0 {
            return 0;
        }
        let reload = state.get(SYST_RVR) & RELOAD_MAX;
        let mut current = state.get(SYST_CVR) & RELOAD_MAX;
        let mut wraps = 0;
        for _ in 0..clocks {
            if current == 0 {
                current = reload;
            } else {
                current -= 1;
                if current == 0 {
                    wraps += 1;
                }
            }
        }
        state.set(SYST_CVR, current);
        if wraps > 0 {
            let csr = state.get(SYST_CSR);
            state.set(SYST_CSR, csr | SYST_COUNTFLAG);
        }
        wraps
    }

    /// Accepted writes in issue order
    #[must_use]
    pub fn write_log(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }

    /// Values written to one address, in order
    #[must_use]
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Writes discarded because the target's clock was off
    #[must_use]
    pub fn dropped_writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().dropped.clone()
    }

    /// Forget the write and dropped-write logs
    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.writes.clear();
        state.dropped.clear();
    }
}

#[allow(unsafe_code)]
impl Mmio for SimBus {
    unsafe fn read(&self, addr: u32) -> u32 {
        self.state.borrow_mut().read(addr)
    }

    unsafe fn write(&self, addr: u32, value: u32) {
        self.state.borrow_mut().write(addr, value);
    }
}
