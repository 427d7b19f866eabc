// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Bring-up library for a PolarFire SoC U54 application hart
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests per module + tests/board.rs, tests/trap_cause.rs
//!
//! PUBLIC API:
//!   - bringup: BringUp sequencer, BringUpReport, software_interrupt_handler
//!   - board: Board (register-level Platform over one physical bus)
//!   - platform / hal: Platform and HartControl seams
//!   - config: BoardConfig::ICICLE_KIT, BringUpConfig::DEFAULT
//!   - trap: mcause decoding, IrqTable, PLIC/CLINT dispatch
//!   - feature: HidFeature boundary to the USB application
//!   - log: log_* macros and sink registration
//!
//! DEPENDENCIES:
//!   - mpfs-hal + MSS drivers (serial-mmuart, irq-plic, irq-clint, mpu-mss,
//!     clkrst-sysreg)
//!   - riscv: CSR access on target
//!   - spin: global log sink and trap record
//!
//! Everything except `arch::riscv` is target independent and tested on the
//! host against `mpfs_hal::mock::RecordingBus`.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]

pub mod arch;
pub mod board;
pub mod bringup;
pub mod config;
pub mod diag;
pub mod feature;
pub mod hal;
pub mod messages;
pub mod platform;
pub mod trap;

pub use diag::log;

pub use board::Board;
pub use bringup::{software_interrupt_handler, BringUp, BringUpReport};
pub use config::{BoardConfig, BringUpConfig, MpuWindow};
pub use feature::HidFeature;
pub use hal::{HartControl, InterruptEnable};
pub use platform::Platform;
