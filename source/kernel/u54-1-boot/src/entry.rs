// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Reset entry, machine trap entry and Rust start for U54_1
//! OWNERS: @bringup
//! PUBLIC API: _start, Software_h1_IRQHandler (exported symbols)
//! DEPENDS_ON: u54_bringup (BringUp, Board, trap), mpfs-hal::MmioBus
//! INVARIANTS: only hart 1 leaves `_start`; the IRQ table is filled before
//!             any interrupt is enabled

use irq_plic::{USB_DMA, USB_MC};
use mpfs_hal::MmioBus;
use spin::Mutex;
use u54_bringup::arch::riscv::{self as arch, LocalHart};
use u54_bringup::trap::{self, IrqHandler, IrqTable, TrapAction, TrapRecord};
use u54_bringup::{log_error, Board, BoardConfig, BringUp, BringUpConfig};

use crate::{console, mouse};

core::arch::global_asm!(
    r#"
    .section .text._start, "ax", @progbits
    .globl _start
    .align 4
_start:
    /* Only U54_1 runs this image; every other hart sleeps for good. */
    csrr t0, mhartid
    li   t1, 1
    bne  t0, t1, 3f
    csrw mie, zero
    la   sp, __stack_top
    .option push
    .option norelax
    la   gp, __global_pointer$
    .option pop
    la   t0, __bss_start
    la   t1, __bss_end
1:
    bgeu t0, t1, 2f
    sd   zero, 0(t0)
    addi t0, t0, 8
    j    1b
2:
    j    start_rust
3:
    wfi
    j    3b

    .section .text.trap, "ax", @progbits
    .globl u54_trap_entry
    .align 4
u54_trap_entry:
    addi sp, sp, -128
    sd   ra,   0(sp)
    sd   t0,   8(sp)
    sd   t1,  16(sp)
    sd   t2,  24(sp)
    sd   t3,  32(sp)
    sd   t4,  40(sp)
    sd   t5,  48(sp)
    sd   t6,  56(sp)
    sd   a0,  64(sp)
    sd   a1,  72(sp)
    sd   a2,  80(sp)
    sd   a3,  88(sp)
    sd   a4,  96(sp)
    sd   a5, 104(sp)
    sd   a6, 112(sp)
    sd   a7, 120(sp)
    call u54_trap_rust
    ld   ra,   0(sp)
    ld   t0,   8(sp)
    ld   t1,  16(sp)
    ld   t2,  24(sp)
    ld   t3,  32(sp)
    ld   t4,  40(sp)
    ld   t5,  48(sp)
    ld   t6,  56(sp)
    ld   a0,  64(sp)
    ld   a1,  72(sp)
    ld   a2,  80(sp)
    ld   a3,  88(sp)
    ld   a4,  96(sp)
    ld   a5, 104(sp)
    ld   a6, 112(sp)
    ld   a7, 120(sp)
    addi sp, sp, 128
    mret
"#
);

extern "C" {
    fn u54_trap_entry();
}

static IRQS: Mutex<IrqTable> = Mutex::new(IrqTable::new());

fn board() -> Board<MmioBus, LocalHart> {
    // SAFETY: M-mode, identity-mapped; ICICLE_KIT describes this SoC.
    let bus = unsafe { MmioBus::physical() };
    Board::new(BoardConfig::ICICLE_KIT, bus, LocalHart)
}

/// Inter-hart software interrupt handler for hart 1.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn Software_h1_IRQHandler() {
    u54_bringup::software_interrupt_handler();
}

fn install_irq_handlers() {
    let mut irqs = IRQS.lock();
    irqs.set_soft_handler(u54_bringup::software_interrupt_handler);
    let usb: [(irq_plic::Source, IrqHandler); 2] =
        [(USB_DMA, mouse::usb_dma_irq), (USB_MC, mouse::usb_mc_irq)];
    for (source, handler) in usb {
        if let Err(err) = irqs.register(source, handler) {
            log_error!(target: "entry", "{}", err);
        }
    }
}

#[no_mangle]
pub extern "C" fn start_rust() -> ! {
    install_irq_handlers();
    // SAFETY: u54_trap_entry is 4-byte aligned, preserves every register it
    // and the Rust dispatcher clobber, and returns with mret.
    unsafe { arch::install_trap_vector(u54_trap_entry as usize) };

    let config = BringUpConfig { log_sink: Some(console::log_sink), ..BringUpConfig::DEFAULT };
    BringUp::new(board(), mouse::ExternMouse, config).run()
}

#[no_mangle]
extern "C" fn u54_trap_rust() {
    let (mcause, mepc, mtval) = arch::read_trap_csrs();
    let record = TrapRecord { mcause, mepc, mtval };
    let board = board();
    let action = {
        let irqs = IRQS.lock();
        trap::handle(&record, &board.plic(), &board.clint(), board.config().hart, &irqs)
    };
    if action == TrapAction::Park {
        loop {
            arch::wait_for_interrupt();
        }
    }
}
