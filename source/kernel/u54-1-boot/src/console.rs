// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! MMUART0 console handles for the log sink and the panic path.
//!
//! Handles are stateless views over the register block, so taking one never
//! blocks. Records emitted from trap context may interleave with the main
//! loop's output.

use core::fmt::Write;

use mpfs_hal::{MmioBus, Window};
use serial_mmuart::MssUart;
use u54_bringup::BoardConfig;

pub type Console = MssUart<Window<MmioBus>>;

/// Lock-free console writer.
pub fn raw_writer() -> Console {
    // SAFETY: M-mode with identity-mapped physical memory; the window is the
    // MMUART0 register block of the board this image is linked for.
    let bus = unsafe { MmioBus::physical() };
    MssUart::new(Window::new(bus, BoardConfig::ICICLE_KIT.console_base))
}

/// `LogSink` installed once the console has been configured.
pub fn log_sink(record: &str) {
    let _ = raw_writer().write_str(record);
}
