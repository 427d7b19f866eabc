// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hart-local control: the CSR side of bring-up.

use bitflags::bitflags;

bitflags! {
    /// Machine-mode bits of `mie` (and `mip`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InterruptEnable: usize {
        const MSIE = 1 << 3;
        const MTIE = 1 << 7;
        const MEIE = 1 << 11;
    }
}

/// Operations on the executing hart's own control registers.
pub trait HartControl {
    /// Replaces the whole of `mie`.
    fn write_mie(&mut self, enable: InterruptEnable);
    /// Sets `mie.MEIE`, leaving other bits alone.
    fn enable_external(&mut self);
    /// `mip.MSIP`.
    fn soft_pending(&self) -> bool;
    fn wait_for_interrupt(&mut self);
    /// Sets `mstatus.MIE`.
    fn enable_global(&mut self);
}
