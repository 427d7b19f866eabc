//! CONTEXT: Tests for the shared register-access primitives
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 3 integration tests
//!
//! TEST_SCOPE:
//!   - Nested windows compose base offsets
//!   - 64-bit access through a window
//!   - Read-modify-write through a window
//!
//! DEPENDENCIES:
//!   - mpfs_hal::{Bus, Window}: HAL primitives
//!   - SparseBus: local register-file stub

use std::cell::RefCell;
use std::collections::BTreeMap;

use mpfs_hal::{Bus, Window};

#[derive(Default)]
struct SparseBus {
    regs: RefCell<BTreeMap<usize, u32>>,
    writes: RefCell<Vec<(usize, u32)>>,
}

impl SparseBus {
    fn peek(&self, offset: usize) -> u32 {
        self.regs.borrow().get(&offset).copied().unwrap_or(0)
    }
}

impl Bus for SparseBus {
    fn read(&self, offset: usize) -> u32 {
        self.peek(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.regs.borrow_mut().insert(offset, value);
        self.writes.borrow_mut().push((offset, value));
    }
}

#[test]
fn nested_windows_compose() {
    let bus = SparseBus::default();
    let mss = Window::new(&bus, 0x2000_0000);
    let mpu = Window::new(mss, 0x5000);
    mpu.write(0x608, 1);
    assert_eq!(bus.peek(0x2000_5608), 1);
}

#[test]
fn wide_access_through_window() {
    let bus = SparseBus::default();
    let mpu = Window::new(&bus, 0x2000_5000);
    mpu.write64(0x608, 0x1f00_0000_0203_ffff);
    assert_eq!(*bus.writes.borrow(), vec![(0x2000_5608, 0x0203_ffff), (0x2000_560c, 0x1f00_0000)]);
    assert_eq!(mpu.read64(0x608), 0x1f00_0000_0203_ffff);
}

#[test]
fn modify_through_window() {
    let bus = SparseBus::default();
    bus.regs.borrow_mut().insert(0x2000_2084, 0x1);
    let sysreg = Window::new(&bus, 0x2000_2000);
    sysreg.modify(0x84, 0, 1 << 16);
    assert_eq!(bus.peek(0x2000_2084), 0x1_0001);
    assert_eq!(*bus.writes.borrow(), vec![(0x2000_2084, 0x1_0001)]);
}
