// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(all(target_arch = "riscv64", target_os = "none"), no_std, no_main)]

//! CONTEXT: Firmware image for U54_1 on the PolarFire SoC Icicle Kit
//! OWNERS: @bringup
//! STATUS: Functional
//! TEST_COVERAGE: none on host (sequencing logic is tested in u54-bringup)
//!
//! Provides `_start`, the machine trap entry, the panic handler and the
//! binding to the externally linked USB HID mouse application, then hands
//! the hart to `u54_bringup::BringUp`.

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod console;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod entry;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod mouse;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod panic;

#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
fn main() {
    println!("u54-1-boot: firmware image; build with --target riscv64gc-unknown-none-elf");
}
