// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Panic handler emitting diagnostics over the console
//! OWNERS: @bringup
//! DEPENDS_ON: console::raw_writer(), u54_bringup::trap::last_trap()
//! INVARIANTS: Minimal formatting; no allocations; never returns

use core::fmt::Write;
use core::panic::PanicInfo;

use u54_bringup::arch::riscv::wait_for_interrupt;
use u54_bringup::trap;

use crate::console;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let mut w = console::raw_writer();

    let _ = w.write_str("\nPANIC: ");
    if let Some(location) = info.location() {
        let _ = w.write_str(location.file());
        let _ = w.write_str(":0x");
        let _ = trap::write_hex(&mut w, location.line() as usize);
        let _ = w.write_str(": ");
    }
    match info.message().as_str() {
        Some(msg) => {
            let _ = w.write_str(msg);
        }
        None => {
            let _ = w.write_str("<complex msg>");
        }
    }
    let _ = w.write_str("\n");

    if let Some(last) = trap::last_trap() {
        let _ = w.write_str("PANIC: last trap: ");
        let _ = trap::write_record(&mut w, &last);
        let _ = w.write_str("\n");
    }
    w.flush();

    loop {
        wait_for_interrupt();
    }
}
