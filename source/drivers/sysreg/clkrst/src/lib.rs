// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: SYSREG sub-block clock gating and soft reset control
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 6 unit tests
//!
//! PUBLIC API:
//!   - ClkRst: configure()/is_running()
//!   - Peripheral: MSS sub-block bit positions
//!   - PeripheralState, ClkRstError
//!
//! DEPENDENCIES:
//!   - mpfs-hal::{Bus, HART_COUNT}
//!
//! `SUBBLK_CLOCK_CR` and `SOFT_RESET_CR` share bit positions. A block runs
//! when its clock bit is set and its reset bit is clear.

#![cfg_attr(not(test), no_std)]

use core::fmt;

use mpfs_hal::{Bus, HART_COUNT};

const SUBBLK_CLOCK_CR: usize = 0x84;
const SOFT_RESET_CR: usize = 0x88;

/// MSS sub-blocks with a clock enable and a soft reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Peripheral {
    Envm = 0,
    Mac0 = 1,
    Mac1 = 2,
    Mmc = 3,
    Timer = 4,
    Mmuart0 = 5,
    Mmuart1 = 6,
    Mmuart2 = 7,
    Mmuart3 = 8,
    Mmuart4 = 9,
    Spi0 = 10,
    Spi1 = 11,
    I2c0 = 12,
    I2c1 = 13,
    Can0 = 14,
    Can1 = 15,
    Usb = 16,
    Rtc = 18,
    Qspi = 19,
    Gpio0 = 20,
    Gpio1 = 21,
    Gpio2 = 22,
    Ddrc = 23,
    Fic0 = 24,
    Fic1 = 25,
    Fic2 = 26,
    Fic3 = 27,
    Athena = 28,
    Cfm = 29,
}

impl Peripheral {
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralState {
    On,
    Off,
}

/// Error type for clock/reset requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "clock/reset errors must be handled"]
pub enum ClkRstError {
    /// Requesting hart is not one of the five MSS harts.
    InvalidHart(u8),
}

impl fmt::Display for ClkRstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHart(hart) => write!(f, "invalid hart {}", hart),
        }
    }
}

pub struct ClkRst<B: Bus> {
    bus: B,
}

impl<B: Bus> ClkRst<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Turns `peripheral` on or off on behalf of `hart`.
    ///
    /// Power-up ungates the clock before releasing reset; power-down asserts
    /// reset before gating. Each write is read back so the next step sees
    /// the settled state.
    pub fn configure(
        &self,
        peripheral: Peripheral,
        hart: u8,
        state: PeripheralState,
    ) -> Result<(), ClkRstError> {
        if hart as usize >= HART_COUNT {
            return Err(ClkRstError::InvalidHart(hart));
        }
        let mask = peripheral.mask();
        match state {
            PeripheralState::On => {
                self.bus.modify(SUBBLK_CLOCK_CR, 0, mask);
                let _ = self.bus.read(SUBBLK_CLOCK_CR);
                self.bus.modify(SOFT_RESET_CR, mask, 0);
                let _ = self.bus.read(SOFT_RESET_CR);
            }
            PeripheralState::Off => {
                self.bus.modify(SOFT_RESET_CR, 0, mask);
                let _ = self.bus.read(SOFT_RESET_CR);
                self.bus.modify(SUBBLK_CLOCK_CR, mask, 0);
                let _ = self.bus.read(SUBBLK_CLOCK_CR);
            }
        }
        Ok(())
    }

    pub fn is_running(&self, peripheral: Peripheral) -> bool {
        let mask = peripheral.mask();
        self.bus.read(SUBBLK_CLOCK_CR) & mask != 0 && self.bus.read(SOFT_RESET_CR) & mask == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpfs_hal::mock::RecordingBus;

    fn out_of_reset() -> RecordingBus {
        let bus = RecordingBus::new();
        // reset value: every block held in reset with its clock gated
        bus.preset(SOFT_RESET_CR, 0x3fff_ffff);
        bus
    }

    #[test]
    fn on_ungates_before_release() {
        let bus = out_of_reset();
        ClkRst::new(&bus).configure(Peripheral::Mmuart0, 1, PeripheralState::On).unwrap();
        let clock = bus.first_write(SUBBLK_CLOCK_CR).unwrap();
        let reset = bus.first_write(SOFT_RESET_CR).unwrap();
        assert!(clock < reset);
        assert_eq!(bus.peek(SUBBLK_CLOCK_CR), 1 << 5);
        assert_eq!(bus.peek(SOFT_RESET_CR), 0x3fff_ffff & !(1 << 5));
    }

    #[test]
    fn off_asserts_reset_before_gating() {
        let bus = RecordingBus::new();
        bus.preset(SUBBLK_CLOCK_CR, 1 << 16);
        ClkRst::new(&bus).configure(Peripheral::Usb, 1, PeripheralState::Off).unwrap();
        assert!(bus.first_write(SOFT_RESET_CR) < bus.first_write(SUBBLK_CLOCK_CR));
        assert_eq!(bus.peek(SUBBLK_CLOCK_CR), 0);
        assert_eq!(bus.peek(SOFT_RESET_CR), 1 << 16);
    }

    #[test]
    fn writes_are_read_back() {
        let bus = out_of_reset();
        ClkRst::new(&bus).configure(Peripheral::Usb, 1, PeripheralState::On).unwrap();
        let log = bus.accesses();
        let reset_write = bus.first_write(SOFT_RESET_CR).unwrap();
        assert!(matches!(log[reset_write + 1], mpfs_hal::mock::Access::Read(SOFT_RESET_CR, _)));
    }

    #[test]
    fn bringup_pair_running() {
        let bus = out_of_reset();
        let clkrst = ClkRst::new(&bus);
        for peripheral in [Peripheral::Mmuart0, Peripheral::Usb] {
            clkrst.configure(peripheral, 1, PeripheralState::On).unwrap();
        }
        assert!(clkrst.is_running(Peripheral::Mmuart0));
        assert!(clkrst.is_running(Peripheral::Usb));
        assert!(!clkrst.is_running(Peripheral::Mmuart1));
    }

    #[test]
    fn hart_out_of_range() {
        let bus = RecordingBus::new();
        let result = ClkRst::new(&bus).configure(Peripheral::Usb, 5, PeripheralState::On);
        assert_eq!(result, Err(ClkRstError::InvalidHart(5)));
        assert!(bus.accesses().is_empty());
    }

    #[test]
    fn bit_positions() {
        assert_eq!(Peripheral::Envm.mask(), 1);
        assert_eq!(Peripheral::Rtc.mask(), 1 << 18);
        assert_eq!(Peripheral::Cfm.mask(), 1 << 29);
    }
}
