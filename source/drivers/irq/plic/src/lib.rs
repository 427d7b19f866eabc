// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Platform-level interrupt controller driver for the MSS core complex
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 10 unit tests + tests/usb_lines.rs
//!
//! PUBLIC API:
//!   - Plic: init/set_priority/enable/disable/set_threshold/claim/complete
//!   - Source, Priority, Context: validated newtypes
//!   - USB_DMA, USB_MC: MSS USB interrupt sources
//!   - PlicError: error type for invalid sources/priorities
//!
//! DEPENDENCIES:
//!   - mpfs-hal::{Bus, HartId}: register access, hart identity
//!
//! INVARIANTS: Source 0 is never valid; priorities are 3-bit; every non-zero
//! claim is completed

#![cfg_attr(not(test), no_std)]

use core::fmt;

use mpfs_hal::{Bus, HartId};

/// Highest interrupt source number wired on the MSS PLIC.
pub const NUM_SOURCES: u32 = 186;

/// Number of 32-bit enable words per context.
const ENABLE_WORDS: usize = (NUM_SOURCES as usize + 32) / 32;

const PRIORITY_BASE: usize = 0x0000;
const PENDING_BASE: usize = 0x1000;
const ENABLE_BASE: usize = 0x2000;
const ENABLE_STRIDE: usize = 0x80;
const CONTEXT_BASE: usize = 0x20_0000;
const CONTEXT_STRIDE: usize = 0x1000;
const THRESHOLD: usize = 0x0;
const CLAIM_COMPLETE: usize = 0x4;

static_assertions::const_assert!(ENABLE_WORDS * 4 <= ENABLE_STRIDE);

/// MSS USB DMA interrupt.
pub const USB_DMA: Source = Source(86);
/// MSS USB packet/media controller interrupt.
pub const USB_MC: Source = Source(87);

/// Error type for PLIC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "PLIC errors must be handled"]
pub enum PlicError {
    /// Source 0 or a source above `NUM_SOURCES`.
    InvalidSource(u32),
    /// Priority above `Priority::MAX`.
    InvalidPriority(u8),
}

impl fmt::Display for PlicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSource(src) => write!(f, "invalid interrupt source {}", src),
            Self::InvalidPriority(prio) => write!(f, "invalid priority {}", prio),
        }
    }
}

/// Interrupt source number, `1..=NUM_SOURCES`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Source(u32);

impl Source {
    pub const fn new(raw: u32) -> Result<Self, PlicError> {
        if raw == 0 || raw > NUM_SOURCES {
            Err(PlicError::InvalidSource(raw))
        } else {
            Ok(Self(raw))
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn word(self) -> usize {
        (self.0 / 32) as usize
    }

    #[inline]
    const fn mask(self) -> u32 {
        1 << (self.0 % 32)
    }
}

/// Interrupt priority. Zero masks the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const NEVER: Self = Self(0);
    pub const MAX: Self = Self(7);

    pub const fn new(raw: u8) -> Result<Self, PlicError> {
        if raw > Self::MAX.0 {
            Err(PlicError::InvalidPriority(raw))
        } else {
            Ok(Self(raw))
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u8 {
        self.0
    }
}

/// PLIC target context (hart + privilege mode).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Context(u32);

impl Context {
    /// Machine-mode context. The E51 only has M-mode and owns context 0;
    /// U54 hart `n` uses `2n - 1` for M-mode and `2n` for S-mode.
    pub const fn machine(hart: HartId) -> Self {
        if hart.is_monitor() {
            Self(0)
        } else {
            Self(2 * hart.as_index() as u32 - 1)
        }
    }

    pub const fn supervisor(hart: HartId) -> Option<Self> {
        if hart.is_monitor() {
            None
        } else {
            Some(Self(2 * hart.as_index() as u32))
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn enable_base(self) -> usize {
        ENABLE_BASE + self.0 as usize * ENABLE_STRIDE
    }

    #[inline]
    const fn control_base(self) -> usize {
        CONTEXT_BASE + self.0 as usize * CONTEXT_STRIDE
    }
}

pub struct Plic<B: Bus> {
    bus: B,
}

impl<B: Bus> Plic<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Masks every source for `ctx` and opens the threshold.
    pub fn init(&self, ctx: Context) {
        for word in 0..ENABLE_WORDS {
            self.bus.write(ctx.enable_base() + word * 4, 0);
        }
        self.set_threshold(ctx, Priority::NEVER);
    }

    pub fn set_priority(&self, src: Source, prio: Priority) {
        self.bus.write(PRIORITY_BASE + src.0 as usize * 4, prio.0 as u32);
    }

    pub fn priority(&self, src: Source) -> Priority {
        Priority((self.bus.read(PRIORITY_BASE + src.0 as usize * 4) & 0x7) as u8)
    }

    pub fn enable(&self, ctx: Context, src: Source) {
        self.bus.modify(ctx.enable_base() + src.word() * 4, 0, src.mask());
    }

    pub fn disable(&self, ctx: Context, src: Source) {
        self.bus.modify(ctx.enable_base() + src.word() * 4, src.mask(), 0);
    }

    pub fn is_enabled(&self, ctx: Context, src: Source) -> bool {
        self.bus.read(ctx.enable_base() + src.word() * 4) & src.mask() != 0
    }

    pub fn is_pending(&self, src: Source) -> bool {
        self.bus.read(PENDING_BASE + src.word() * 4) & src.mask() != 0
    }

    /// Sources at or below `threshold` are not delivered to `ctx`.
    pub fn set_threshold(&self, ctx: Context, threshold: Priority) {
        self.bus.write(ctx.control_base() + THRESHOLD, threshold.0 as u32);
    }

    /// Claims the highest-priority pending source, if any.
    ///
    /// An ID outside the wired range is completed on the spot and reported
    /// as nothing pending, so its gateway is not left blocked.
    pub fn claim(&self, ctx: Context) -> Option<Source> {
        let claim = ctx.control_base() + CLAIM_COMPLETE;
        match self.bus.read(claim) {
            0 => None,
            raw => match Source::new(raw) {
                Ok(src) => Some(src),
                Err(_) => {
                    self.bus.write(claim, raw);
                    None
                }
            },
        }
    }

    /// Signals completion so `src` can be delivered again.
    pub fn complete(&self, ctx: Context, src: Source) {
        self.bus.write(ctx.control_base() + CLAIM_COMPLETE, src.0);
    }
}
