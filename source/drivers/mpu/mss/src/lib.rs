// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: MSS memory protection unit (per bus-master PMP windows)
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 10 unit tests + tests/napot.rs (proptest)
//!
//! PUBLIC API:
//!   - Mpu: configure()/region() per master and region
//!   - Master, Permissions, MatchMode, RegionConfig
//!   - MpuError: error type for rejected configurations
//!
//! DEPENDENCIES:
//!   - mpfs-hal::Bus
//!
//! INVARIANTS: locked entries are never rewritten; NAPOT windows are
//! power-of-two sized, at least 4 KiB, and aligned to their size

#![cfg_attr(not(test), no_std)]

use core::fmt;

use bitflags::bitflags;
use mpfs_hal::Bus;

const MASTER_STRIDE: usize = 0x100;
const ENTRY_SIZE: usize = 8;

const ADDR_BITS: u32 = 36;
const ADDR_MASK: u64 = (1 << ADDR_BITS) - 1;
const CFG_SHIFT: u32 = 56;
const MODE_SHIFT: u32 = 3;
const CFG_LOCK: u64 = 1 << 7;

/// Smallest window the MSS MPU can express.
pub const MIN_REGION_SIZE: u64 = 4 * 1024;
/// Physical addresses reachable through a 36-bit `pmpaddr`.
pub const ADDRESS_LIMIT: u64 = 1 << (ADDR_BITS + 2);

/// Bus masters that sit behind an MSS MPU block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Master {
    Fic0 = 0,
    Fic1 = 1,
    Fic2 = 2,
    Crypto = 3,
    Gem0 = 4,
    Gem1 = 5,
    Usb = 6,
    Mmc = 7,
    Scb = 8,
    Trace = 9,
}

impl Master {
    /// Number of PMP entries implemented for this master.
    pub const fn region_count(self) -> u8 {
        match self {
            Master::Fic0 | Master::Fic1 => 16,
            Master::Fic2 | Master::Gem0 | Master::Gem1 | Master::Scb => 8,
            Master::Crypto | Master::Usb | Master::Mmc => 4,
            Master::Trace => 2,
        }
    }

    #[inline]
    const fn block(self) -> usize {
        self as usize * MASTER_STRIDE
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Permissions: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
        const RWX = Self::READ.bits() | Self::WRITE.bits() | Self::EXEC.bits();
    }
}

/// Address matching mode of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MatchMode {
    Off = 0,
    Tor = 1,
    Na4 = 2,
    Napot = 3,
}

impl MatchMode {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => MatchMode::Off,
            1 => MatchMode::Tor,
            2 => MatchMode::Na4,
            _ => MatchMode::Napot,
        }
    }
}

/// Decoded MPU entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionConfig {
    pub base: u64,
    pub size: u64,
    pub permissions: Permissions,
    pub mode: MatchMode,
    pub locked: bool,
}

/// Error type for MPU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "MPU errors must be handled"]
pub enum MpuError {
    /// The master does not implement that many regions.
    RegionOutOfRange,
    /// The entry has its lock bit set until the next reset.
    Locked,
    SizeNotPowerOfTwo,
    SizeTooSmall,
    /// Base address is not aligned to the window size.
    Misaligned,
    /// Window extends past the 38-bit physical address space.
    AddressOutOfRange,
    /// Only NAPOT and OFF are meaningful for the MSS MPU.
    UnsupportedMode,
}

impl fmt::Display for MpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionOutOfRange => write!(f, "region index out of range"),
            Self::Locked => write!(f, "region locked"),
            Self::SizeNotPowerOfTwo => write!(f, "size is not a power of two"),
            Self::SizeTooSmall => write!(f, "size below 4 KiB"),
            Self::Misaligned => write!(f, "base not aligned to size"),
            Self::AddressOutOfRange => write!(f, "window beyond physical address space"),
            Self::UnsupportedMode => write!(f, "unsupported match mode"),
        }
    }
}

/// Encodes a NAPOT `pmpaddr` value for `base`/`size`.
///
/// Sizes below 8 bytes have no NAPOT form and encode as `base` alone.
pub const fn napot_address(base: u64, size: u64) -> u64 {
    ((base | (size >> 1).saturating_sub(1)) >> 2) & ADDR_MASK
}

pub struct Mpu<B: Bus> {
    bus: B,
}

impl<B: Bus> Mpu<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    #[inline]
    fn entry_offset(master: Master, region: u8) -> usize {
        master.block() + region as usize * ENTRY_SIZE
    }

    fn check_region(master: Master, region: u8) -> Result<usize, MpuError> {
        if region >= master.region_count() {
            return Err(MpuError::RegionOutOfRange);
        }
        Ok(Self::entry_offset(master, region))
    }

    /// Programs one window for `master`.
    ///
    /// Nothing is written when any argument is rejected or the entry is
    /// already locked.
    #[allow(clippy::too_many_arguments)]
    pub fn configure(
        &self,
        master: Master,
        region: u8,
        base: u64,
        size: u64,
        permissions: Permissions,
        mode: MatchMode,
        lock: bool,
    ) -> Result<(), MpuError> {
        let offset = Self::check_region(master, region)?;
        let address = match mode {
            MatchMode::Napot => {
                if !size.is_power_of_two() {
                    return Err(MpuError::SizeNotPowerOfTwo);
                }
                if size < MIN_REGION_SIZE {
                    return Err(MpuError::SizeTooSmall);
                }
                if base % size != 0 {
                    return Err(MpuError::Misaligned);
                }
                if base.checked_add(size).map_or(true, |end| end > ADDRESS_LIMIT) {
                    return Err(MpuError::AddressOutOfRange);
                }
                napot_address(base, size)
            }
            MatchMode::Off => (base >> 2) & ADDR_MASK,
            MatchMode::Tor | MatchMode::Na4 => return Err(MpuError::UnsupportedMode),
        };

        if self.bus.read64(offset) >> CFG_SHIFT & CFG_LOCK != 0 {
            return Err(MpuError::Locked);
        }

        let mut cfg = permissions.bits() as u64 | (mode as u64) << MODE_SHIFT;
        if lock {
            cfg |= CFG_LOCK;
        }
        self.bus.write64(offset, address | cfg << CFG_SHIFT);
        Ok(())
    }

    /// Reads back and decodes one entry.
    pub fn region(&self, master: Master, region: u8) -> Result<RegionConfig, MpuError> {
        let raw = self.bus.read64(Self::check_region(master, region)?);
        let cfg = (raw >> CFG_SHIFT) as u8;
        let address = raw & ADDR_MASK;
        let mode = MatchMode::from_bits(cfg >> MODE_SHIFT);
        let (base, size) = match mode {
            MatchMode::Napot => {
                let ones = (!address).trailing_zeros().min(ADDR_BITS);
                let size = 1u64 << (ones + 3);
                ((address & !((1u64 << ones) - 1)) << 2, size)
            }
            MatchMode::Na4 => (address << 2, 4),
            MatchMode::Off | MatchMode::Tor => (address << 2, 0),
        };
        Ok(RegionConfig {
            base,
            size,
            permissions: Permissions::from_bits_truncate(cfg),
            mode,
            locked: cfg as u64 & CFG_LOCK != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpfs_hal::mock::RecordingBus;

    const LIM_BASE: u64 = 0x0800_0000;
    const LIM_SIZE: u64 = 0x20_0000;

    fn usb_lim(mpu: &Mpu<&RecordingBus>, region: u8) -> Result<(), MpuError> {
        mpu.configure(Master::Usb, region, LIM_BASE, LIM_SIZE, Permissions::RWX, MatchMode::Napot, false)
    }

    #[test]
    fn usb_lim_window_encoding() {
        let bus = RecordingBus::new();
        usb_lim(&Mpu::new(&bus), 1).unwrap();
        assert_eq!(bus.peek64(0x608), 0x1f00_0000_0203_ffff);
    }

    #[test]
    fn decode_round_trips_usb_window() {
        let bus = RecordingBus::new();
        let mpu = Mpu::new(&bus);
        usb_lim(&mpu, 1).unwrap();
        let region = mpu.region(Master::Usb, 1).unwrap();
        assert_eq!(
            region,
            RegionConfig {
                base: LIM_BASE,
                size: LIM_SIZE,
                permissions: Permissions::RWX,
                mode: MatchMode::Napot,
                locked: false,
            }
        );
    }

    #[test]
    fn region_beyond_master_rejected() {
        let bus = RecordingBus::new();
        assert_eq!(usb_lim(&Mpu::new(&bus), 4), Err(MpuError::RegionOutOfRange));
        assert!(bus.accesses().is_empty());
    }

    #[test]
    fn locked_entry_not_rewritten() {
        let bus = RecordingBus::new();
        bus.preset(0x60c, 0x8000_0000);
        let mpu = Mpu::new(&bus);
        assert_eq!(usb_lim(&mpu, 1), Err(MpuError::Locked));
        assert!(bus.writes_to(0x608).is_empty());
        assert!(mpu.region(Master::Usb, 1).unwrap().locked);
    }

    #[test]
    fn geometry_checks() {
        let bus = RecordingBus::new();
        let mpu = Mpu::new(&bus);
        let cfg = |base, size| {
            mpu.configure(Master::Fic0, 0, base, size, Permissions::READ, MatchMode::Napot, false)
        };
        assert_eq!(cfg(0x0800_0000, 0x30_0000), Err(MpuError::SizeNotPowerOfTwo));
        assert_eq!(cfg(0x0800_0000, 0x800), Err(MpuError::SizeTooSmall));
        assert_eq!(cfg(0x0810_0000, 0x20_0000), Err(MpuError::Misaligned));
        assert_eq!(cfg(ADDRESS_LIMIT, 0x1000), Err(MpuError::AddressOutOfRange));
    }

    #[test]
    fn tor_rejected() {
        let bus = RecordingBus::new();
        let result =
            Mpu::new(&bus).configure(Master::Scb, 0, 0, 0x1000, Permissions::READ, MatchMode::Tor, false);
        assert_eq!(result, Err(MpuError::UnsupportedMode));
    }

    #[test]
    fn lock_bit_set_on_request() {
        let bus = RecordingBus::new();
        let mpu = Mpu::new(&bus);
        mpu.configure(Master::Trace, 1, 0x1000, 0x1000, Permissions::READ, MatchMode::Napot, true)
            .unwrap();
        assert_eq!(bus.peek64(0x908) >> 63, 1);
        assert_eq!(
            mpu.configure(Master::Trace, 1, 0, 0x1000, Permissions::READ, MatchMode::Napot, false),
            Err(MpuError::Locked)
        );
    }

    #[test]
    fn masters_are_0x100_apart() {
        let bus = RecordingBus::new();
        let mpu = Mpu::new(&bus);
        mpu.configure(Master::Mmc, 3, 0x1000, 0x1000, Permissions::WRITE, MatchMode::Napot, false)
            .unwrap();
        assert_ne!(bus.peek64(0x700 + 3 * 8), 0);
    }

    #[test]
    fn napot_encoding_of_degenerate_sizes() {
        assert_eq!(napot_address(0x1000, 0), 0x400);
        assert_eq!(napot_address(0x1000, 1), 0x400);
        assert_eq!(napot_address(0x1000, 2), 0x400);
        assert_eq!(napot_address(LIM_BASE, LIM_SIZE), 0x0203_ffff);
    }

    #[test]
    fn region_counts() {
        assert_eq!(Master::Fic1.region_count(), 16);
        assert_eq!(Master::Usb.region_count(), 4);
        assert_eq!(Master::Trace.region_count(), 2);
    }
}
