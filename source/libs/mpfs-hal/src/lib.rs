// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Register-access primitives shared by the MSS drivers
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 5 unit tests + tests/bus.rs
//!
//! PUBLIC API:
//!   - Bus: 32/64-bit register access at a byte offset
//!   - MmioBus: volatile accessor over physical memory
//!   - Window: device register block carved out of a larger bus
//!   - HartId: hart identity (E51 monitor = 0, U54 = 1..=4)
//!   - mock::RecordingBus (feature `mock`): register-file fake for tests

#![cfg_attr(not(any(test, feature = "mock")), no_std)]

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use core::fmt;

/// Register access at a byte offset from the start of a device block.
pub trait Bus {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);

    /// Reads a 64-bit register as two 32-bit halves, low word first.
    fn read64(&self, offset: usize) -> u64 {
        let lo = self.read(offset) as u64;
        let hi = self.read(offset + 4) as u64;
        (hi << 32) | lo
    }

    /// Writes a 64-bit register as two 32-bit halves, low word first.
    fn write64(&self, offset: usize, value: u64) {
        self.write(offset, value as u32);
        self.write(offset + 4, (value >> 32) as u32);
    }

    /// Read-modify-write helper: `reg = (reg & !clear) | set`.
    fn modify(&self, offset: usize, clear: u32, set: u32) {
        let value = self.read(offset);
        self.write(offset, (value & !clear) | set);
    }
}

impl<B: Bus + ?Sized> Bus for &B {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }

    fn read64(&self, offset: usize) -> u64 {
        (**self).read64(offset)
    }

    fn write64(&self, offset: usize, value: u64) {
        (**self).write64(offset, value)
    }
}

/// Volatile memory-mapped accessor.
#[derive(Clone, Copy, Debug)]
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// Creates an accessor rooted at `base`.
    ///
    /// # Safety
    ///
    /// Every offset later passed to the accessor must address a device
    /// register (or RAM) that is valid for volatile access from this hart.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Accessor over the whole identity-mapped physical address space.
    ///
    /// # Safety
    ///
    /// See [`MmioBus::new`]. Bare-metal M-mode only.
    pub const unsafe fn physical() -> Self {
        Self { base: 0 }
    }

    pub const fn base(&self) -> usize {
        self.base
    }
}

impl Bus for MmioBus {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: construction contract of `MmioBus::new`.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: construction contract of `MmioBus::new`.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }

    fn read64(&self, offset: usize) -> u64 {
        // SAFETY: construction contract of `MmioBus::new`; MPU entries are
        // naturally aligned 64-bit registers.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u64) }
    }

    fn write64(&self, offset: usize, value: u64) {
        // SAFETY: as for `read64`.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u64, value) }
    }
}

/// A device register block starting at `base` inside `bus`.
#[derive(Clone, Copy, Debug)]
pub struct Window<B: Bus> {
    bus: B,
    base: usize,
}

impl<B: Bus> Window<B> {
    pub const fn new(bus: B, base: usize) -> Self {
        Self { bus, base }
    }

    pub const fn base(&self) -> usize {
        self.base
    }
}

impl<B: Bus> Bus for Window<B> {
    fn read(&self, offset: usize) -> u32 {
        self.bus.read(self.base + offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.bus.write(self.base + offset, value)
    }

    fn read64(&self, offset: usize) -> u64 {
        self.bus.read64(self.base + offset)
    }

    fn write64(&self, offset: usize, value: u64) {
        self.bus.write64(self.base + offset, value)
    }
}

/// Number of harts in the MSS core complex (E51 + four U54).
pub const HART_COUNT: usize = 5;

/// Hardware thread identifier.
///
/// **Invariant**: always `< HART_COUNT`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct HartId(u8);

impl HartId {
    /// The E51 monitor hart that releases the application harts.
    pub const MONITOR: Self = Self(0);
    pub const U54_1: Self = Self(1);
    pub const U54_2: Self = Self(2);
    pub const U54_3: Self = Self(3);
    pub const U54_4: Self = Self(4);

    pub const fn new(raw: usize) -> Option<Self> {
        if raw < HART_COUNT {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_monitor(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hart{}", self.0)
    }
}

static_assertions::const_assert!(HART_COUNT <= u8::MAX as usize);
