// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! RISC-V machine-mode helpers for the U54 application harts.
//!
//! CSR access goes through the `riscv` crate on target. Host builds get
//! inert `#[cfg(not(target_arch = "riscv64"))]` stubs so the rest of the
//! crate stays testable.

use crate::hal::{HartControl, InterruptEnable};

/// [`HartControl`] for the hart executing the code.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalHart;

impl HartControl for LocalHart {
    fn write_mie(&mut self, enable: InterruptEnable) {
        #[cfg(target_arch = "riscv64")]
        unsafe {
            core::arch::asm!("csrw mie, {0}", in(reg) enable.bits(), options(nomem, nostack));
        }
        #[cfg(not(target_arch = "riscv64"))]
        {
            let _ = enable;
        }
    }

    fn enable_external(&mut self) {
        #[cfg(target_arch = "riscv64")]
        // SAFETY: the PLIC context is initialised before this is called.
        unsafe {
            riscv::register::mie::set_mext();
        }
    }

    fn soft_pending(&self) -> bool {
        #[cfg(target_arch = "riscv64")]
        {
            riscv::register::mip::read().msoft()
        }
        #[cfg(not(target_arch = "riscv64"))]
        {
            false
        }
    }

    fn wait_for_interrupt(&mut self) {
        wait_for_interrupt();
    }

    fn enable_global(&mut self) {
        #[cfg(target_arch = "riscv64")]
        // SAFETY: the trap vector is installed before bring-up starts.
        unsafe {
            riscv::register::mstatus::set_mie();
        }
    }
}

/// Issues a WFI instruction or yields on the host.
#[inline]
pub fn wait_for_interrupt() {
    #[cfg(target_arch = "riscv64")]
    unsafe {
        core::arch::asm!("wfi", options(nomem, nostack, preserves_flags));
    }
    #[cfg(not(target_arch = "riscv64"))]
    {
        core::hint::spin_loop();
    }
}

/// Installs `handler` as the direct-mode machine trap vector.
///
/// # Safety
///
/// `handler` must be the address of a 4-byte aligned trap entry that saves
/// and restores all state it clobbers and returns with `mret`.
#[inline]
pub unsafe fn install_trap_vector(handler: usize) {
    #[cfg(target_arch = "riscv64")]
    {
        use riscv::register::mtvec::{self, TrapMode};
        mtvec::write(handler, TrapMode::Direct);
    }
    #[cfg(not(target_arch = "riscv64"))]
    {
        let _ = handler;
    }
}

/// Machine trap CSRs captured on entry to the dispatcher.
#[inline]
pub fn read_trap_csrs() -> (usize, usize, usize) {
    #[cfg(target_arch = "riscv64")]
    {
        use riscv::register::{mcause, mepc, mtval};
        (mcause::read().bits(), mepc::read(), mtval::read())
    }
    #[cfg(not(target_arch = "riscv64"))]
    {
        (0, 0, 0)
    }
}
