// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

//! Register-file fake for host tests.
//!
//! Unwritten registers read as zero. Every `read`/`write` through the [`Bus`]
//! interface is appended to an access log; `preset`/`peek` bypass the log so
//! tests can stage and inspect state without disturbing ordering assertions.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::vec::Vec;

use crate::Bus;

/// One logged register access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read(usize, u32),
    Write(usize, u32),
}

impl Access {
    pub fn offset(&self) -> usize {
        match *self {
            Access::Read(offset, _) | Access::Write(offset, _) => offset,
        }
    }
}

#[derive(Default)]
pub struct RecordingBus {
    regs: RefCell<BTreeMap<usize, u32>>,
    log: RefCell<Vec<Access>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a register value without logging an access.
    pub fn preset(&self, offset: usize, value: u32) {
        self.regs.borrow_mut().insert(offset, value);
    }

    /// Inspects a register value without logging an access.
    pub fn peek(&self, offset: usize) -> u32 {
        self.regs.borrow().get(&offset).copied().unwrap_or(0)
    }

    /// Inspects a 64-bit register stored as two words.
    pub fn peek64(&self, offset: usize) -> u64 {
        ((self.peek(offset + 4) as u64) << 32) | self.peek(offset) as u64
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    /// Values written to `offset`, in order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter_map(|access| match *access {
                Access::Write(o, value) if o == offset => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Position of the first write to `offset` in the access log.
    pub fn first_write(&self, offset: usize) -> Option<usize> {
        self.log
            .borrow()
            .iter()
            .position(|access| matches!(*access, Access::Write(o, _) if o == offset))
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Bus for RecordingBus {
    fn read(&self, offset: usize) -> u32 {
        let value = self.peek(offset);
        self.log.borrow_mut().push(Access::Read(offset, value));
        value
    }

    fn write(&self, offset: usize, value: u32) {
        self.regs.borrow_mut().insert(offset, value);
        self.log.borrow_mut().push(Access::Write(offset, value));
    }
}
