//! CONTEXT: Integration test for routing the MSS USB lines to U54_1 M-mode
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 2 integration tests
//!
//! TEST_SCENARIOS:
//!   - usb_lines_routed_to_hart1(): both lines enabled at priority 2, nothing else
//!   - other_contexts_untouched(): hart1 routing leaves hart2 enables alone
//!
//! DEPENDENCIES:
//!   - irq_plic::{Plic, Context, Priority, USB_DMA, USB_MC}
//!   - PlicStub: local register-file stub

use std::cell::RefCell;
use std::collections::BTreeMap;

use irq_plic::{Context, Plic, Priority, USB_DMA, USB_MC};
use mpfs_hal::{Bus, HartId};

#[derive(Default)]
struct PlicStub {
    regs: RefCell<BTreeMap<usize, u32>>,
}

impl Bus for PlicStub {
    fn read(&self, offset: usize) -> u32 {
        self.regs.borrow().get(&offset).copied().unwrap_or(0)
    }

    fn write(&self, offset: usize, value: u32) {
        self.regs.borrow_mut().insert(offset, value);
    }
}

fn route_usb(plic: &Plic<&PlicStub>, ctx: Context) {
    plic.init(ctx);
    let prio = Priority::new(2).unwrap();
    plic.set_priority(USB_DMA, prio);
    plic.set_priority(USB_MC, prio);
    plic.enable(ctx, USB_DMA);
    plic.enable(ctx, USB_MC);
}

#[test]
fn usb_lines_routed_to_hart1() {
    let stub = PlicStub::default();
    let plic = Plic::new(&stub);
    let ctx = Context::machine(HartId::U54_1);
    route_usb(&plic, ctx);

    assert_eq!(plic.priority(USB_DMA).as_raw(), 2);
    assert_eq!(plic.priority(USB_MC).as_raw(), 2);
    assert!(plic.is_enabled(ctx, USB_DMA));
    assert!(plic.is_enabled(ctx, USB_MC));
    let enabled: u32 = (0..6).map(|w| stub.read(0x2080 + w * 4).count_ones()).sum();
    assert_eq!(enabled, 2);
}

#[test]
fn other_contexts_untouched() {
    let stub = PlicStub::default();
    stub.write(0x2000 + 3 * 0x80 + 8, 0xdead_beef);
    let plic = Plic::new(&stub);
    route_usb(&plic, Context::machine(HartId::U54_1));
    assert_eq!(stub.read(0x2000 + 3 * 0x80 + 8), 0xdead_beef);
}
