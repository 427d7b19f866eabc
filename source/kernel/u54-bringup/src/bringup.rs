// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: One-shot hardware bring-up of a U54 application hart, followed by
//!          the unbounded HID feature loop
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 9 unit tests + tests/board.rs, tests/log_sink.rs
//! PUBLIC API: BringUp (new/bring_up/poll/run), BringUpReport,
//!             software_interrupt_handler()
//! DEPENDS_ON: platform::Platform, feature::HidFeature, config::BringUpConfig
//! INVARIANTS:
//!   - MSIP is cleared before any other interrupt source is enabled
//!   - exactly one of the two MPU messages reaches the console
//!   - both USB lines are prioritised and enabled before HidFeature::init
//!   - nothing fails the sequence: errors are reported and bring-up goes on
//!
//! Order of operations:
//!   1. clear MSIP, `mie` = MSIE only
//!   2. wait for the monitor hart's release (unless pre-loaded), clear MSIP
//!   3. clock + reset release for the console UART, then USB
//!   4. console at 115200 8N1
//!   5. MPU window for USB DMA into LIM, outcome on the console
//!   6. PLIC context init, USB priorities, USB enables
//!   7. driver/feature banners
//!   8. `mstatus.MIE`
//!   9. feature init
//!  10. feature task, forever

use clkrst_sysreg::{ClkRstError, Peripheral, PeripheralState};
use mpu_mss::MpuError;
use serial_mmuart::UartError;

use crate::config::BringUpConfig;
use crate::diag::log;
use crate::feature::HidFeature;
use crate::messages;
use crate::platform::Platform;

/// What happened during [`BringUp::bring_up`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "the report carries the outcome of each fallible step"]
pub struct BringUpReport {
    /// The release wait ran (the image was not pre-loaded).
    pub waited_for_release: bool,
    pub console_clock: Result<(), ClkRstError>,
    pub usb_clock: Result<(), ClkRstError>,
    pub console: Result<(), UartError>,
    pub mpu: Result<(), MpuError>,
}

impl BringUpReport {
    /// Every checked step succeeded.
    pub fn is_clean(&self) -> bool {
        self.console_clock.is_ok() && self.usb_clock.is_ok() && self.console.is_ok() && self.mpu.is_ok()
    }
}

/// Bring-up sequencer for one hart.
pub struct BringUp<P: Platform, F: HidFeature> {
    platform: P,
    feature: F,
    config: BringUpConfig,
}

impl<P: Platform, F: HidFeature> BringUp<P, F> {
    pub fn new(platform: P, feature: F, config: BringUpConfig) -> Self {
        Self { platform, feature, config }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    /// Runs steps 1 through 9. Must be called once, before any [`poll`](Self::poll).
    pub fn bring_up(&mut self) -> BringUpReport {
        self.platform.clear_soft_interrupt();
        self.platform.enable_soft_interrupt_only();

        let waited_for_release = self.config.wait_for_release;
        if waited_for_release {
            self.wait_for_release();
        }

        let console_clock = self.platform.clock_and_reset(Peripheral::Mmuart0, PeripheralState::On);
        let usb_clock = self.platform.clock_and_reset(Peripheral::Usb, PeripheralState::On);

        let console = self.platform.console_init(self.config.baud, self.config.line);
        if console.is_ok() {
            if let Some(sink) = self.config.log_sink {
                log::set_sink(sink);
            }
        }
        #[cfg(feature = "boot_banner")]
        crate::log_info!(target: "bringup", "u54 bring-up on {}", self.platform.hart());
        if let Err(err) = console {
            // No sink is installed yet, so this only reaches a debugger.
            crate::log_warn!(target: "bringup", "console init failed: {}", err);
        }
        // Clock/reset requests cannot fail for a valid hart; keep the record.
        #[cfg(feature = "debug_uart")]
        crate::log_debug!(target: "bringup", "clkrst console={:?} usb={:?}", console_clock, usb_clock);

        let window = self.config.usb_window;
        let mpu = self.platform.mpu_configure(&window);
        match mpu {
            Ok(()) => self.platform.console_write(messages::MPU_USB_CONFIGURED),
            Err(err) => {
                self.platform.console_write(messages::MPU_USB_FAILED);
                crate::log_error!(target: "bringup", "mpu {:?} region {}: {}", window.master, window.region, err);
            }
        }

        self.platform.plic_init();
        for source in self.config.usb_sources {
            self.platform.plic_set_priority(source, self.config.usb_priority);
        }
        for source in self.config.usb_sources {
            self.platform.plic_enable(source);
        }
        #[cfg(feature = "debug_uart")]
        crate::log_info!(target: "bringup", "plic: usb lines at priority {}", self.config.usb_priority.as_raw());

        self.platform.console_write(messages::USB_DRIVER_READY);
        self.platform.console_write(messages::MOUSE_FEATURE_BANNER);

        self.platform.enable_global_interrupts();
        self.feature.init();

        BringUpReport { waited_for_release, console_clock, usb_clock, console, mpu }
    }

    /// Sleeps until the monitor hart raises our MSIP, then consumes it.
    ///
    /// There is no timeout. A monitor that never signals stalls this hart.
    fn wait_for_release(&mut self) {
        loop {
            self.platform.wait_for_interrupt();
            if self.platform.soft_interrupt_pending() {
                break;
            }
        }
        self.platform.clear_soft_interrupt();
        #[cfg(feature = "debug_uart")]
        crate::log_info!(target: "bringup", "released by monitor hart");
    }

    /// One iteration of the feature loop.
    #[inline]
    pub fn poll(&mut self) {
        self.feature.task();
    }

    /// Brings the hart up and hands it to the feature for good.
    pub fn run(mut self) -> ! {
        let report = self.bring_up();
        if !report.is_clean() {
            crate::log_warn!(target: "bringup", "continuing after errors: {:?}", report);
        }
        loop {
            self.poll();
        }
    }
}

/// Machine software interrupt handler for this hart.
///
/// The interrupt only exists to release the hart from its wait; once running
/// there is nothing to do. The dispatcher clears MSIP after this returns.
pub fn software_interrupt_handler() {}
