//! Memory-mapped register access
//!
//! Every register access in the crate goes through [`Mmio`]. On target the
//! implementation is [`Device`], a volatile load/store at the physical
//! address. On host the `sim` register model implements the same trait, so
//! the drivers run unchanged in tests.
//!
//! Raw access is `unsafe` to call. Drivers only reach registers through
//! [`Block`], whose base addresses come from the fixed peripheral tables.

#![allow(unsafe_code)]

use core::ptr;

/// Word-addressed register bus
pub trait Mmio {
    /// Read the 32-bit register at `addr`
    ///
    /// # Safety
    ///
    /// `addr` must be a word-aligned register of a peripheral whose clock
    /// is enabled.
    unsafe fn read(&self, addr: u32) -> u32;

    /// Write the 32-bit register at `addr`
    ///
    /// # Safety
    ///
    /// Same as [`Mmio::read`]; the write may change hardware state owned
    /// by other code.
    unsafe fn write(&self, addr: u32, value: u32);
}

/// The microcontroller's own address space
#[derive(Clone, Copy, Debug, Default)]
pub struct Device;

impl Mmio for Device {
    #[inline(always)]
    unsafe fn read(&self, addr: u32) -> u32 {
        ptr::read_volatile(addr as usize as *const u32)
    }

    #[inline(always)]
    unsafe fn write(&self, addr: u32, value: u32) {
        ptr::write_volatile(addr as usize as *mut u32, value);
    }
}

/// A bitfield inside a 32-bit register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    shift: u8,
    width: u8,
}

impl Field {
    /// Field of `width` bits starting at bit `shift`
    #[must_use]
    pub const fn new(shift: u8, width: u8) -> Self {
        Self { shift, width }
    }

    /// The `index`-th field of a register packed with `width`-bit fields
    #[must_use]
    pub const fn nth(index: u8, width: u8) -> Self {
        Self::new(index * width, width)
    }

    /// Single bit
    #[must_use]
    pub const fn bit(shift: u8) -> Self {
        Self::new(shift, 1)
    }

    /// In-place mask of the field
    #[must_use]
    pub const fn mask(self) -> u32 {
        let ones = if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        };
        ones << self.shift
    }

    /// Position `value` inside the field, dropping bits that do not fit
    #[must_use]
    pub const fn place(self, value: u32) -> u32 {
        (value << self.shift) & self.mask()
    }

    /// Extract the field from a register value
    #[must_use]
    pub const fn extract(self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.shift
    }
}

/// One peripheral's register block: a bus plus a base address
pub(crate) struct Block<'a, B: Mmio> {
    bus: &'a B,
    base: u32,
}

impl<'a, B: Mmio> Block<'a, B> {
    pub(crate) const fn new(bus: &'a B, base: u32) -> Self {
        Self { bus, base }
    }

    pub(crate) fn read(&self, offset: u32) -> u32 {
        // SAFETY: `base` comes from the crate's peripheral tables and
        // `offset` from the register maps in the driver modules.
        unsafe { self.bus.read(self.base + offset) }
    }

    pub(crate) fn write(&self, offset: u32, value: u32) {
        // SAFETY: see `read`.
        unsafe { self.bus.write(self.base + offset, value) }
    }

    /// Read-modify-write of the whole register
    pub(crate) fn modify(&self, offset: u32, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    pub(crate) fn set_bits(&self, offset: u32, mask: u32) {
        self.modify(offset, |v| v | mask);
    }

    pub(crate) fn clear_bits(&self, offset: u32, mask: u32) {
        self.modify(offset, |v| v & !mask);
    }

    /// Clear `field` and write `value` into it, leaving the other bits alone
    pub(crate) fn write_field(&self, offset: u32, field: Field, value: u32) {
        self.modify(offset, |v| (v & !field.mask()) | field.place(value));
    }

    pub(crate) fn read_field(&self, offset: u32, field: Field) -> u32 {
        field.extract(self.read(offset))
    }

    pub(crate) fn is_set(&self, offset: u32, mask: u32) -> bool {
        self.read(offset) & mask != 0
    }
}
