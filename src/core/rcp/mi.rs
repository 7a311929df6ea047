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

//! MIPS Interface (MI)
//!
//! The MI collects the interrupt requests of every RCP block and drives the
//! CPU's IP2 line with `MI_INTR & MI_INTR_MASK`.
//!
//! ## Registers
//!
//! - **MI_INIT_MODE** (0x04300000): init length and mode bits, written as set/clear pairs
//! - **MI_VERSION** (0x04300004): RCP version (read-only)
//! - **MI_INTR** (0x04300008): pending interrupts (read-only)
//! - **MI_INTR_MASK** (0x0430000C): enabled interrupts, written as set/clear pairs
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit | Source | Description
//! ----|--------|-------------------------------
//! 0   | SP     | Signal processor break / task
//! 1   | SI     | Serial DMA complete
//! 2   | AI     | Audio DMA complete
//! 3   | VI     | Vertical interrupt
//! 4   | PI     | Peripheral DMA complete
//! 5   | DP     | Display processor full sync
//! ```

use bitflags::bitflags;

use super::apply_set_clear;
use crate::core::memory::layout::MI_REGS_COUNT;
use crate::core::memory::{masked_write, MemoryHandler, RegisterFile};
use crate::core::r4300::{Cp0, CAUSE_IP2};

pub const MI_INIT_MODE_REG: usize = 0;
pub const MI_VERSION_REG: usize = 1;
pub const MI_INTR_REG: usize = 2;
pub const MI_INTR_MASK_REG: usize = 3;

/// RCP version reported by MI_VERSION
pub const MI_VERSION: u32 = 0x0202_0102;

const MI_INIT_LENGTH_MASK: u32 = 0x7F;
const MI_INIT_MODE: u32 = 0x080;
const MI_EBUS_TEST_MODE: u32 = 0x100;
const MI_RDRAM_REG_MODE: u32 = 0x200;

const MI_CLR_DP_INTR: u32 = 0x800;

bitflags! {
    /// RCP interrupt sources
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MiIntr: u32 {
        const SP = 1 << 0;
        const SI = 1 << 1;
        const AI = 1 << 2;
        const VI = 1 << 3;
        const PI = 1 << 4;
        const DP = 1 << 5;
    }
}

/// MIPS interface
pub struct MiController {
    pub regs: RegisterFile<MI_REGS_COUNT>,
}

impl MiController {
    pub fn new() -> Self {
        let mut mi = Self {
            regs: RegisterFile::new(),
        };
        mi.poweron();
        mi
    }

    /// Clear every register and report the RCP version
    pub fn poweron(&mut self) {
        self.regs.reset();
        self.regs.set(MI_VERSION_REG, MI_VERSION);
    }

    /// Pending interrupts
    pub fn intr(&self) -> MiIntr {
        MiIntr::from_bits_truncate(self.regs.get(MI_INTR_REG))
    }

    /// Enabled interrupts
    pub fn intr_mask(&self) -> MiIntr {
        MiIntr::from_bits_truncate(self.regs.get(MI_INTR_MASK_REG))
    }

    /// Read an MI register
    pub fn read(&mut self, address: u32) -> u32 {
        self.regs.read_word(address)
    }

    /// Write an MI register
    ///
    /// MI_INIT_MODE and MI_INTR_MASK take set/clear command words; the
    /// other registers are read-only.
    pub fn write(&mut self, address: u32, value: u32, mask: u32, cp0: &mut Cp0) {
        let command = value & mask;

        match RegisterFile::<MI_REGS_COUNT>::index(address) {
            MI_INIT_MODE_REG => {
                let reg = self.regs.get_mut(MI_INIT_MODE_REG);
                masked_write(reg, command, MI_INIT_LENGTH_MASK);
                apply_set_clear(
                    reg,
                    command,
                    &[
                        (0x0080, 0x0100, MI_INIT_MODE),
                        (0x0200, 0x0400, MI_EBUS_TEST_MODE),
                        (0x1000, 0x2000, MI_RDRAM_REG_MODE),
                    ],
                );
                if command & MI_CLR_DP_INTR != 0 {
                    self.clear(MiIntr::DP, cp0);
                }
            }
            MI_INTR_MASK_REG => {
                apply_set_clear(
                    self.regs.get_mut(MI_INTR_MASK_REG),
                    command,
                    &[
                        (0x001, 0x002, MiIntr::SP.bits()),
                        (0x004, 0x008, MiIntr::SI.bits()),
                        (0x010, 0x020, MiIntr::AI.bits()),
                        (0x040, 0x080, MiIntr::VI.bits()),
                        (0x100, 0x200, MiIntr::PI.bits()),
                        (0x400, 0x800, MiIntr::DP.bits()),
                    ],
                );
                self.update_interrupt_line(cp0);
            }
            reg => log::trace!("MI: write to read-only register {} ignored", reg),
        }
    }

    /// Raise RCP interrupt sources
    pub fn raise(&mut self, sources: MiIntr, cp0: &mut Cp0) {
        *self.regs.get_mut(MI_INTR_REG) |= sources.bits();
        self.update_interrupt_line(cp0);
    }

    /// Acknowledge RCP interrupt sources
    pub fn clear(&mut self, sources: MiIntr, cp0: &mut Cp0) {
        *self.regs.get_mut(MI_INTR_REG) &= !sources.bits();
        self.update_interrupt_line(cp0);
    }

    /// Drive CP0 IP2 from the pending and enabled sources
    fn update_interrupt_line(&self, cp0: &mut Cp0) {
        cp0.set_interrupt_line(CAUSE_IP2, !(self.intr() & self.intr_mask()).is_empty());
    }
}

impl Default for MiController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MI_INIT_MODE_ADDR: u32 = 0x0430_0000;
    const MI_VERSION_ADDR: u32 = 0x0430_0004;
    const MI_INTR_ADDR: u32 = 0x0430_0008;
    const MI_INTR_MASK_ADDR: u32 = 0x0430_000C;

    #[test]
    fn test_version_after_poweron() {
        let mut mi = MiController::new();
        assert_eq!(mi.read(MI_VERSION_ADDR), MI_VERSION);
    }

    #[test]
    fn test_raise_without_mask_keeps_line_low() {
        let mut mi = MiController::new();
        let mut cp0 = Cp0::new();

        mi.raise(MiIntr::VI, &mut cp0);

        assert_eq!(mi.read(MI_INTR_ADDR), MiIntr::VI.bits());
        assert_eq!(cp0.cause() & CAUSE_IP2, 0);
    }

    #[test]
    fn test_mask_set_asserts_ip2() {
        let mut mi = MiController::new();
        let mut cp0 = Cp0::new();
        mi.raise(MiIntr::VI, &mut cp0);

        // set VI mask
        mi.write(MI_INTR_MASK_ADDR, 0x080, 0xFFFF_FFFF, &mut cp0);

        assert_eq!(mi.intr_mask(), MiIntr::VI);
        assert_ne!(cp0.cause() & CAUSE_IP2, 0);

        mi.clear(MiIntr::VI, &mut cp0);
        assert_eq!(cp0.cause() & CAUSE_IP2, 0);
    }

    #[test]
    fn test_mask_clear_pairs() {
        let mut mi = MiController::new();
        let mut cp0 = Cp0::new();

        mi.write(MI_INTR_MASK_ADDR, 0xAAA, 0xFFFF_FFFF, &mut cp0);
        assert_eq!(mi.intr_mask(), MiIntr::all());

        mi.write(MI_INTR_MASK_ADDR, 0x001 | 0x400, 0xFFFF_FFFF, &mut cp0);
        assert_eq!(
            mi.intr_mask(),
            MiIntr::SI | MiIntr::AI | MiIntr::VI | MiIntr::PI
        );
    }

    #[test]
    fn test_init_mode_clears_dp_interrupt() {
        let mut mi = MiController::new();
        let mut cp0 = Cp0::new();
        mi.write(MI_INTR_MASK_ADDR, 0x800, 0xFFFF_FFFF, &mut cp0);
        mi.raise(MiIntr::DP, &mut cp0);
        assert_ne!(cp0.cause() & CAUSE_IP2, 0);

        mi.write(MI_INIT_MODE_ADDR, MI_CLR_DP_INTR | 0x10F, 0xFFFF_FFFF, &mut cp0);

        assert!(mi.intr().is_empty());
        assert_eq!(cp0.cause() & CAUSE_IP2, 0);
        assert_eq!(mi.read(MI_INIT_MODE_ADDR), 0x0F | MI_INIT_MODE);
    }

    #[test]
    fn test_read_only_registers() {
        let mut mi = MiController::new();
        let mut cp0 = Cp0::new();

        mi.write(MI_VERSION_ADDR, 0, 0xFFFF_FFFF, &mut cp0);
        mi.write(MI_INTR_ADDR, 0x3F, 0xFFFF_FFFF, &mut cp0);

        assert_eq!(mi.read(MI_VERSION_ADDR), MI_VERSION);
        assert!(mi.intr().is_empty());
    }
}
