// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Machine-mode trap decoding and interrupt dispatch
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 10 unit tests
//! PUBLIC API: TrapCause, IrqTable, IrqAction, dispatch_external(), dispatch_soft(),
//!             handle(), record()/last_trap()
//! DEPENDS_ON: irq-plic (claim/complete), irq-clint (MSIP), spin::Mutex
//! INVARIANTS: every claimed source is completed exactly once; MSIP is
//!             cleared after the soft handler returns
//!
//! The assembly entry in the firmware saves caller-saved registers, reads
//! the trap CSRs and calls into [`handle`]. Interrupts resume the
//! interrupted code; exceptions are recorded and the hart is parked.

use core::fmt::{self, Write};

use irq_clint::Clint;
use irq_plic::{Context, Plic, Source, NUM_SOURCES};
use mpfs_hal::{Bus, HartId};
use spin::Mutex;

const INTERRUPT_FLAG: usize = 1 << (usize::BITS - 1);

/// Decoded `mcause`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapCause {
    SoftwareInterrupt,
    TimerInterrupt,
    ExternalInterrupt,
    /// Any other interrupt code (local interrupts on the U54).
    Interrupt(usize),
    Exception(usize),
}

impl TrapCause {
    pub const fn from_mcause(bits: usize) -> Self {
        let code = bits & !INTERRUPT_FLAG;
        if bits & INTERRUPT_FLAG != 0 {
            match code {
                3 => Self::SoftwareInterrupt,
                7 => Self::TimerInterrupt,
                11 => Self::ExternalInterrupt,
                other => Self::Interrupt(other),
            }
        } else {
            Self::Exception(code)
        }
    }

    pub const fn is_interrupt(self) -> bool {
        !matches!(self, Self::Exception(_))
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::SoftwareInterrupt => "MachineSoftInt",
            Self::TimerInterrupt => "MachineTimerInt",
            Self::ExternalInterrupt => "MachineExternalInt",
            Self::Interrupt(_) => "Interrupt",
            Self::Exception(code) => match code {
                0 => "InstructionAddressMisaligned",
                1 => "InstructionAccessFault",
                2 => "IllegalInstruction",
                3 => "Breakpoint",
                4 => "LoadAddressMisaligned",
                5 => "LoadAccessFault",
                6 => "StoreAddressMisaligned",
                7 => "StoreAccessFault",
                11 => "MachineEnvCall",
                _ => "Exception",
            },
        }
    }
}

/// What to do with a PLIC source once its handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrqAction {
    KeepEnabled,
    /// Clear the source's enable bit for this context after completion.
    Disable,
}

impl IrqAction {
    /// Maps a C handler's return code; 1 requests the line be disabled.
    pub const fn from_raw(code: u8) -> Self {
        match code {
            1 => Self::Disable,
            _ => Self::KeepEnabled,
        }
    }
}

pub type IrqHandler = fn() -> IrqAction;
pub type SoftHandler = fn();

/// Error type for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "registration errors must be handled"]
pub enum TrapError {
    AlreadyRegistered(Source),
}

impl fmt::Display for TrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered(src) => {
                write!(f, "source {} already has a handler", src.as_raw())
            }
        }
    }
}

/// PLIC source to handler map plus the software-interrupt handler.
pub struct IrqTable {
    handlers: [Option<IrqHandler>; NUM_SOURCES as usize + 1],
    soft: Option<SoftHandler>,
}

impl IrqTable {
    pub const fn new() -> Self {
        Self { handlers: [None; NUM_SOURCES as usize + 1], soft: None }
    }

    pub fn register(&mut self, source: Source, handler: IrqHandler) -> Result<(), TrapError> {
        let slot = &mut self.handlers[source.as_raw() as usize];
        if slot.is_some() {
            return Err(TrapError::AlreadyRegistered(source));
        }
        *slot = Some(handler);
        Ok(())
    }

    pub fn unregister(&mut self, source: Source) -> Option<IrqHandler> {
        self.handlers[source.as_raw() as usize].take()
    }

    pub fn handler(&self, source: Source) -> Option<IrqHandler> {
        self.handlers[source.as_raw() as usize]
    }

    pub fn set_soft_handler(&mut self, handler: SoftHandler) {
        self.soft = Some(handler);
    }

    pub fn soft_handler(&self) -> Option<SoftHandler> {
        self.soft
    }
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one external-interrupt dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub handled: usize,
    /// Claimed sources without a registered handler.
    pub spurious: usize,
    /// Sources whose handler asked for the line to be disabled.
    pub disabled: usize,
}

/// Claims, handles and completes sources until the PLIC reports none pending.
///
/// A source whose handler returns [`IrqAction::Disable`] is disabled for
/// `ctx` after it has been completed.
pub fn dispatch_external<B: Bus>(plic: &Plic<B>, ctx: Context, table: &IrqTable) -> DispatchStats {
    let mut stats = DispatchStats::default();
    while let Some(source) = plic.claim(ctx) {
        let action = match table.handler(source) {
            Some(handler) => {
                stats.handled += 1;
                handler()
            }
            None => {
                stats.spurious += 1;
                IrqAction::KeepEnabled
            }
        };
        plic.complete(ctx, source);
        if action == IrqAction::Disable {
            plic.disable(ctx, source);
            stats.disabled += 1;
        }
    }
    stats
}

/// Runs the soft handler, then drops `hart`'s MSIP so the trap is not retaken.
pub fn dispatch_soft<B: Bus>(clint: &Clint<B>, hart: HartId, table: &IrqTable) {
    if let Some(handler) = table.soft_handler() {
        handler();
    }
    clint.clear_soft(hart);
}

/// Machine trap CSRs at the time of the trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapRecord {
    pub mcause: usize,
    pub mepc: usize,
    pub mtval: usize,
}

impl TrapRecord {
    pub const fn cause(&self) -> TrapCause {
        TrapCause::from_mcause(self.mcause)
    }
}

impl fmt::Display for TrapRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mcause=0x{:x} mepc=0x{:x} mtval=0x{:x}",
            self.cause().describe(),
            self.mcause,
            self.mepc,
            self.mtval
        )
    }
}

static LAST_TRAP: Mutex<Option<TrapRecord>> = Mutex::new(None);

pub fn record(trap: &TrapRecord) {
    *LAST_TRAP.lock() = Some(*trap);
}

pub fn last_trap() -> Option<TrapRecord> {
    *LAST_TRAP.lock()
}

/// What the assembly entry does after [`handle`] returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapAction {
    /// `mret` to the interrupted code.
    Resume,
    /// Unrecoverable; park the hart.
    Park,
}

/// Dispatches one machine trap.
pub fn handle<B: Bus>(
    trap: &TrapRecord,
    plic: &Plic<B>,
    clint: &Clint<B>,
    hart: HartId,
    table: &IrqTable,
) -> TrapAction {
    match trap.cause() {
        TrapCause::SoftwareInterrupt => {
            dispatch_soft(clint, hart, table);
            TrapAction::Resume
        }
        TrapCause::ExternalInterrupt => {
            let stats = dispatch_external(plic, Context::machine(hart), table);
            if stats.spurious != 0 {
                crate::log_warn!(target: "trap", "{} unhandled PLIC claims", stats.spurious);
            }
            TrapAction::Resume
        }
        TrapCause::TimerInterrupt | TrapCause::Interrupt(_) => {
            crate::log_warn!(target: "trap", "unexpected {}", trap);
            TrapAction::Resume
        }
        TrapCause::Exception(_) => {
            record(trap);
            crate::log_error!(target: "trap", "{}", trap);
            TrapAction::Park
        }
    }
}

/// Writes `trap` without formatting machinery, for panic paths.
pub fn write_record<W: Write>(w: &mut W, trap: &TrapRecord) -> fmt::Result {
    w.write_str(trap.cause().describe())?;
    w.write_str(" mcause=0x")?;
    write_hex(w, trap.mcause)?;
    w.write_str(" mepc=0x")?;
    write_hex(w, trap.mepc)?;
    w.write_str(" mtval=0x")?;
    write_hex(w, trap.mtval)
}

/// Fixed-width lowercase hex of `value`.
pub fn write_hex<W: Write>(w: &mut W, value: usize) -> fmt::Result {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut i = core::mem::size_of::<usize>() * 2;
    while i > 0 {
        i -= 1;
        let nibble = (value >> (i * 4)) & 0xf;
        w.write_char(LUT[nibble] as char)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use irq_plic::{USB_DMA, USB_MC};
    use mpfs_hal::mock::RecordingBus;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::string::String;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HART1_CLAIM: usize = 0x20_1004;

    #[test]
    fn mcause_decoding() {
        assert_eq!(TrapCause::from_mcause(INTERRUPT_FLAG | 3), TrapCause::SoftwareInterrupt);
        assert_eq!(TrapCause::from_mcause(INTERRUPT_FLAG | 11), TrapCause::ExternalInterrupt);
        assert_eq!(TrapCause::from_mcause(INTERRUPT_FLAG | 16), TrapCause::Interrupt(16));
        assert_eq!(TrapCause::from_mcause(2), TrapCause::Exception(2));
        assert!(!TrapCause::Exception(5).is_interrupt());
        assert_eq!(TrapCause::Exception(7).describe(), "StoreAccessFault");
    }

    #[test]
    fn double_registration_rejected() {
        fn noop() -> IrqAction {
            IrqAction::KeepEnabled
        }
        let mut table = IrqTable::new();
        table.register(USB_DMA, noop).unwrap();
        assert_eq!(table.register(USB_DMA, noop), Err(TrapError::AlreadyRegistered(USB_DMA)));
        assert!(table.unregister(USB_DMA).is_some());
        assert!(table.handler(USB_DMA).is_none());
    }

    /// Register file whose claim register yields a scripted sequence.
    struct ClaimQueue {
        regs: RecordingBus,
        claims: RefCell<VecDeque<u32>>,
    }

    impl Bus for ClaimQueue {
        fn read(&self, offset: usize) -> u32 {
            if offset == HART1_CLAIM {
                return self.claims.borrow_mut().pop_front().unwrap_or(0);
            }
            self.regs.read(offset)
        }

        fn write(&self, offset: usize, value: u32) {
            self.regs.write(offset, value)
        }
    }

    static MC_HITS: AtomicUsize = AtomicUsize::new(0);
    fn on_mc() -> IrqAction {
        MC_HITS.fetch_add(1, Ordering::SeqCst);
        IrqAction::KeepEnabled
    }

    #[test]
    fn claims_are_handled_and_completed() {
        let bus = ClaimQueue {
            regs: RecordingBus::new(),
            claims: RefCell::new(VecDeque::from([USB_MC.as_raw(), USB_DMA.as_raw()])),
        };
        let mut table = IrqTable::new();
        table.register(USB_MC, on_mc).unwrap();

        let stats = dispatch_external(&Plic::new(&bus), Context::machine(HartId::U54_1), &table);
        assert_eq!(stats, DispatchStats { handled: 1, spurious: 1, disabled: 0 });
        assert_eq!(bus.regs.writes_to(HART1_CLAIM), vec![87, 86]);
        assert_eq!(MC_HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disable_request_clears_enable_after_complete() {
        fn one_shot() -> IrqAction {
            IrqAction::from_raw(1)
        }
        const HART1_USB_ENABLES: usize = 0x2080 + 8;
        let bus = ClaimQueue {
            regs: RecordingBus::new(),
            claims: RefCell::new(VecDeque::from([USB_DMA.as_raw()])),
        };
        bus.regs.preset(HART1_USB_ENABLES, (1 << 22) | (1 << 23));
        let mut table = IrqTable::new();
        table.register(USB_DMA, one_shot).unwrap();

        let stats = dispatch_external(&Plic::new(&bus), Context::machine(HartId::U54_1), &table);
        assert_eq!(stats, DispatchStats { handled: 1, spurious: 0, disabled: 1 });
        assert_eq!(bus.regs.peek(HART1_USB_ENABLES), 1 << 23);
        let complete = bus.regs.first_write(HART1_CLAIM).unwrap();
        let disable = bus.regs.first_write(HART1_USB_ENABLES).unwrap();
        assert!(complete < disable);
    }

    #[test]
    fn handler_codes() {
        assert_eq!(IrqAction::from_raw(0), IrqAction::KeepEnabled);
        assert_eq!(IrqAction::from_raw(1), IrqAction::Disable);
        assert_eq!(IrqAction::from_raw(7), IrqAction::KeepEnabled);
    }

    #[test]
    fn empty_claim_dispatches_nothing() {
        let bus = RecordingBus::new();
        let stats = dispatch_external(&Plic::new(&bus), Context::machine(HartId::U54_1), &IrqTable::new());
        assert_eq!(stats, DispatchStats::default());
        assert!(bus.writes_to(HART1_CLAIM).is_empty());
    }

    #[test]
    fn soft_interrupt_clears_msip() {
        let bus = RecordingBus::new();
        bus.preset(4, 1);
        let mut table = IrqTable::new();
        table.set_soft_handler(crate::bringup::software_interrupt_handler);
        let trap = TrapRecord { mcause: INTERRUPT_FLAG | 3, mepc: 0, mtval: 0 };
        let action = handle(&trap, &Plic::new(&bus), &Clint::new(&bus), HartId::U54_1, &table);
        assert_eq!(action, TrapAction::Resume);
        assert_eq!(bus.peek(4), 0);
    }

    #[test]
    fn exception_recorded_and_parks() {
        let bus = RecordingBus::new();
        let trap = TrapRecord { mcause: 5, mepc: 0x0800_1000, mtval: 0xdead };
        let action =
            handle(&trap, &Plic::new(&bus), &Clint::new(&bus), HartId::U54_1, &IrqTable::new());
        assert_eq!(action, TrapAction::Park);
        assert_eq!(last_trap(), Some(trap));
    }

    #[test]
    fn record_rendering() {
        let trap = TrapRecord { mcause: 2, mepc: 0x10, mtval: 0 };
        let mut out = String::new();
        write_record(&mut out, &trap).unwrap();
        assert!(out.starts_with("IllegalInstruction mcause=0x0000000000000002"));
        assert_eq!(std::format!("{}", trap), "IllegalInstruction mcause=0x2 mepc=0x10 mtval=0x0");
    }

    #[test]
    fn hex_is_fixed_width() {
        let mut out = String::new();
        write_hex(&mut out, 0xab).unwrap();
        assert_eq!(out.len(), core::mem::size_of::<usize>() * 2);
        assert!(out.ends_with("ab"));
    }
}
