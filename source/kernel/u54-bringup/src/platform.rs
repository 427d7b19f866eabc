// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! The sequencer's view of the hardware.
//!
//! One method per primitive the bring-up sequence performs. [`crate::board::Board`]
//! provides the register-level implementation; tests substitute recorders.

use clkrst_sysreg::{ClkRstError, Peripheral, PeripheralState};
use irq_plic::{Priority, Source};
use mpfs_hal::HartId;
use mpu_mss::MpuError;
use serial_mmuart::{LineConfig, UartError};

use crate::config::MpuWindow;

pub trait Platform {
    /// Hart the sequence runs on.
    fn hart(&self) -> HartId;

    /// Clears this hart's MSIP in the CLINT, confirmed by a read-back.
    fn clear_soft_interrupt(&mut self);
    /// Writes `mie` so that only the machine software interrupt is enabled.
    fn enable_soft_interrupt_only(&mut self);
    /// `mip.MSIP`.
    fn soft_interrupt_pending(&self) -> bool;
    fn wait_for_interrupt(&mut self);

    fn clock_and_reset(
        &mut self,
        peripheral: Peripheral,
        state: PeripheralState,
    ) -> Result<(), ClkRstError>;

    fn console_init(&mut self, baud: u32, line: LineConfig) -> Result<(), UartError>;
    /// Raw console output, blocking until every byte is queued.
    fn console_write(&mut self, bytes: &[u8]);

    fn mpu_configure(&mut self, window: &MpuWindow) -> Result<(), MpuError>;

    /// Masks every source for this hart's M-mode context, opens the
    /// threshold and sets `mie.MEIE`.
    fn plic_init(&mut self);
    fn plic_set_priority(&mut self, source: Source, priority: Priority);
    fn plic_enable(&mut self, source: Source);

    /// Sets `mstatus.MIE`.
    fn enable_global_interrupts(&mut self);
}
