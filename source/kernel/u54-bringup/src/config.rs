// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Compile-time configuration for the board and the bring-up run
//! OWNERS: @bringup
//! PUBLIC API: BoardConfig::ICICLE_KIT, BringUpConfig::DEFAULT, MpuWindow
//!
//! There are no runtime configuration sources. Cargo features select the
//! release handshake and diagnostics; everything else is a `const`.

use clkrst_sysreg::Peripheral;
use irq_plic::{Priority, Source, USB_DMA, USB_MC};
use mpfs_hal::HartId;
use mpu_mss::{MatchMode, Master, Permissions};
use serial_mmuart::{LineConfig, BAUD_115200};

use crate::diag::log::LogSink;

/// Peripheral placement and clocking of one board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    /// Hart this image runs on.
    pub hart: HartId,
    pub clint_base: usize,
    pub plic_base: usize,
    pub sysreg_base: usize,
    pub mpu_base: usize,
    pub console_base: usize,
    /// Clock/reset bit of the console UART.
    pub console_peripheral: Peripheral,
    /// APB clock feeding the MSS UARTs.
    pub pclk_hz: u32,
}

impl BoardConfig {
    /// Microchip PolarFire SoC Icicle Kit, U54_1, console on MMUART0.
    pub const ICICLE_KIT: Self = Self {
        hart: HartId::U54_1,
        clint_base: 0x0200_0000,
        plic_base: 0x0c00_0000,
        sysreg_base: 0x2000_2000,
        mpu_base: 0x2000_5000,
        console_base: 0x2000_0000,
        console_peripheral: Peripheral::Mmuart0,
        pclk_hz: 150_000_000,
    };
}

/// One MSS MPU window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MpuWindow {
    pub master: Master,
    pub region: u8,
    pub base: u64,
    pub size: u64,
    pub permissions: Permissions,
    pub mode: MatchMode,
    pub lock: bool,
}

impl MpuWindow {
    /// USB DMA access to the 2 MiB LIM at `0x0800_0000`.
    pub const USB_LIM: Self = Self {
        master: Master::Usb,
        region: 1,
        base: 0x0800_0000,
        size: 0x20_0000,
        permissions: Permissions::RWX,
        mode: MatchMode::Napot,
        lock: false,
    };
}

/// Parameters of a bring-up run.
#[derive(Clone, Copy)]
pub struct BringUpConfig {
    /// Block in `wfi` until the monitor hart raises our MSIP.
    pub wait_for_release: bool,
    pub baud: u32,
    pub line: LineConfig,
    pub usb_window: MpuWindow,
    /// USB interrupt lines, enabled in order.
    pub usb_sources: [Source; 2],
    pub usb_priority: Priority,
    /// Installed once the console is configured.
    pub log_sink: Option<LogSink>,
}

const USB_PRIORITY: Priority = match Priority::new(2) {
    Ok(priority) => priority,
    Err(_) => Priority::NEVER,
};

impl BringUpConfig {
    pub const DEFAULT: Self = Self {
        wait_for_release: !cfg!(feature = "image-loaded-by-bootloader"),
        baud: BAUD_115200,
        line: LineConfig::EIGHT_N_ONE,
        usb_window: MpuWindow::USB_LIM,
        usb_sources: [USB_DMA, USB_MC],
        usb_priority: USB_PRIORITY,
        log_sink: None,
    };
}

impl Default for BringUpConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static_assertions::const_assert_eq!(BringUpConfig::DEFAULT.usb_priority.as_raw(), 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icicle_kit_runs_on_first_u54() {
        assert_eq!(BoardConfig::ICICLE_KIT.hart, HartId::U54_1);
        assert_eq!(BoardConfig::ICICLE_KIT.console_peripheral, Peripheral::Mmuart0);
    }

    #[test]
    fn release_wait_follows_feature() {
        assert_eq!(
            BringUpConfig::DEFAULT.wait_for_release,
            !cfg!(feature = "image-loaded-by-bootloader")
        );
    }
}
