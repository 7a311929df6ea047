// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Coprocessor 0 (System Control)
//!
//! Only the registers the device layer touches are modeled with behavior:
//! Count/Compare drive the timer interrupt, Cause carries the external
//! interrupt lines (IP2 from the MI, IP3 from the disk drive, IP4 from the
//! PIF reset signal, IP7 from the timer) and Status/ErrorEPC are set by the
//! soft reset sequence.

/// Cause register: RCP interrupt line (MI)
pub const CAUSE_IP2: u32 = 0x0000_0400;
/// Cause register: cartridge / disk drive interrupt line
pub const CAUSE_IP3: u32 = 0x0000_0800;
/// Cause register: pre-NMI reset signal
pub const CAUSE_IP4: u32 = 0x0000_1000;
/// Cause register: timer interrupt
pub const CAUSE_IP7: u32 = 0x0000_8000;
/// Cause register: exception code field
pub const CAUSE_EXCCODE_MASK: u32 = 0x0000_007C;

/// Status register: interrupt enable
pub const STATUS_IE: u32 = 0x0000_0001;
/// Status register: exception level
pub const STATUS_EXL: u32 = 0x0000_0002;
/// Status register: error level
pub const STATUS_ERL: u32 = 0x0000_0004;
/// Status register: interrupt mask bit 4
pub const STATUS_IM4: u32 = 0x0000_1000;
/// Status register: soft reset occurred
pub const STATUS_SR: u32 = 0x0010_0000;
/// Status register: TLB shutdown
pub const STATUS_TS: u32 = 0x0020_0000;
/// Status register: bootstrap exception vectors
pub const STATUS_BEV: u32 = 0x0040_0000;

/// Coprocessor 0 register file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cp0 {
    /// CP0 registers (32 registers)
    pub regs: [u32; 32],
}

impl Cp0 {
    /// Timer count
    pub const COUNT: usize = 9;
    /// Timer compare
    pub const COMPARE: usize = 11;
    /// Status register
    pub const STATUS: usize = 12;
    /// Cause register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;
    /// Configuration
    pub const CONFIG: usize = 16;
    /// Error exception PC
    pub const ERROR_EPC: usize = 30;

    /// Create a CP0 with power-on register values
    pub fn new() -> Self {
        let mut regs = [0u32; 32];
        regs[Self::STATUS] = 0x3400_0000;
        // VR4300 implementation / revision
        regs[Self::PRID] = 0x0000_0B22;
        regs[Self::CONFIG] = 0x7006_E463;
        Self { regs }
    }

    /// Restore power-on register values
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.regs[Self::COUNT]
    }

    #[inline]
    pub fn compare(&self) -> u32 {
        self.regs[Self::COMPARE]
    }

    #[inline]
    pub fn status(&self) -> u32 {
        self.regs[Self::STATUS]
    }

    #[inline]
    pub fn cause(&self) -> u32 {
        self.regs[Self::CAUSE]
    }

    /// Assert or release an external interrupt line in Cause
    ///
    /// # Arguments
    ///
    /// * `line` - One of the `CAUSE_IPx` bits
    /// * `asserted` - New level of the line
    pub fn set_interrupt_line(&mut self, line: u32, asserted: bool) {
        if asserted {
            self.regs[Self::CAUSE] |= line;
        } else {
            self.regs[Self::CAUSE] &= !line;
        }
    }

    /// Check whether an enabled interrupt is pending
    ///
    /// The execution core polls this to decide when to take an interrupt
    /// exception.
    pub fn interrupt_pending(&self) -> bool {
        let status = self.status();
        let enabled = status & STATUS_IE != 0 && status & (STATUS_EXL | STATUS_ERL) == 0;
        enabled && (self.cause() & status & 0xFF00) != 0
    }

    /// Cycles until Count reaches Compare (a full wrap when they are equal)
    pub fn cycles_to_compare(&self) -> u64 {
        match self.compare().wrapping_sub(self.count()) {
            0 => 1 << 32,
            delta => delta as u64,
        }
    }
}

impl Default for Cp0 {
    fn default() -> Self {
        Self::new()
    }
}
