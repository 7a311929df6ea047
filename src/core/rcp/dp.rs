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

//! Display Processor (DP) interface
//!
//! Command list registers of the RDP. Rasterization is not modelled: a
//! submitted list (START..END) is walked command by command and, if it
//! contains a full sync, the DP interrupt is scheduled for when the list
//! would have drained.
//!
//! Command lists are read from RDRAM, or from SP DMEM when the XBUS bit
//! of DPC_STATUS is set.

use super::apply_set_clear;
use super::mi::{MiController, MiIntr};
use crate::core::memory::layout::{DPC_REGS_COUNT, DPS_REGS_COUNT};
use crate::core::memory::{read_be_word, MemoryHandler, RegisterFile};
use crate::core::r4300::{InterruptKind, R4300};

pub const DPC_START_REG: usize = 0;
pub const DPC_END_REG: usize = 1;
pub const DPC_CURRENT_REG: usize = 2;
pub const DPC_STATUS_REG: usize = 3;
pub const DPC_CLOCK_REG: usize = 4;
pub const DPC_BUFBUSY_REG: usize = 5;
pub const DPC_PIPEBUSY_REG: usize = 6;
pub const DPC_TMEM_REG: usize = 7;

pub const DPC_STATUS_XBUS_DMEM_DMA: u32 = 0x001;
pub const DPC_STATUS_FREEZE: u32 = 0x002;
pub const DPC_STATUS_FLUSH: u32 = 0x004;
pub const DPC_STATUS_START_GCLK: u32 = 0x008;
pub const DPC_STATUS_TMEM_BUSY: u32 = 0x010;
pub const DPC_STATUS_PIPE_BUSY: u32 = 0x020;
pub const DPC_STATUS_CMD_BUSY: u32 = 0x040;
pub const DPC_STATUS_CBUF_READY: u32 = 0x080;
pub const DPC_STATUS_DMA_BUSY: u32 = 0x100;
pub const DPC_STATUS_END_VALID: u32 = 0x200;
pub const DPC_STATUS_START_VALID: u32 = 0x400;

/// Full sync command id
const RDP_CMD_SYNC_FULL: u32 = 0x29;

/// Length in 64-bit words of an RDP command
fn command_words(id: u32) -> u32 {
    match id {
        0x08 => 4,
        0x09 => 6,
        0x0A | 0x0C => 12,
        0x0B | 0x0D => 14,
        0x0E => 20,
        0x0F => 22,
        0x24 | 0x25 => 2,
        _ => 1,
    }
}

/// Display processor interface
pub struct Rdp {
    pub dpc_regs: RegisterFile<DPC_REGS_COUNT>,
    pub dps_regs: RegisterFile<DPS_REGS_COUNT>,
}

impl Rdp {
    pub fn new() -> Self {
        let mut dp = Self {
            dpc_regs: RegisterFile::new(),
            dps_regs: RegisterFile::new(),
        };
        dp.poweron();
        dp
    }

    pub fn poweron(&mut self) {
        self.dpc_regs.reset();
        self.dps_regs.reset();
        self.dpc_regs.set(DPC_STATUS_REG, DPC_STATUS_CBUF_READY);
    }

    pub fn status(&self) -> u32 {
        self.dpc_regs.get(DPC_STATUS_REG)
    }

    pub fn read_dpc(&mut self, address: u32) -> u32 {
        self.dpc_regs.read_word(address)
    }

    /// Write a DP command register
    ///
    /// # Arguments
    ///
    /// * `dram` - RDRAM bytes, source of command lists
    /// * `dmem` - SP memory bytes, source of command lists in XBUS mode
    pub fn write_dpc(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        dram: &[u8],
        dmem: &[u8],
        r4300: &mut R4300,
    ) {
        match RegisterFile::<DPC_REGS_COUNT>::index(address) {
            DPC_START_REG => {
                if self.status() & DPC_STATUS_START_VALID == 0 {
                    self.dpc_regs.write_word(address, value, mask);
                    *self.dpc_regs.get_mut(DPC_START_REG) &= 0xFF_FFF8;
                }
                *self.dpc_regs.get_mut(DPC_STATUS_REG) |= DPC_STATUS_START_VALID;
            }
            DPC_END_REG => {
                self.dpc_regs.write_word(address, value, mask);
                *self.dpc_regs.get_mut(DPC_END_REG) &= 0xFF_FFF8;
                self.process_list(dram, dmem, r4300);
            }
            DPC_STATUS_REG => self.update_status(value & mask),
            reg => log::trace!("DP: write to read-only register {} ignored", reg),
        }
    }

    pub fn read_dps(&mut self, address: u32) -> u32 {
        self.dps_regs.read_word(address)
    }

    pub fn write_dps(&mut self, address: u32, value: u32, mask: u32) {
        self.dps_regs.write_word(address, value, mask);
    }

    /// Full sync reached: raise DP
    pub fn full_sync(&mut self, mi: &mut MiController, r4300: &mut R4300) {
        *self.dpc_regs.get_mut(DPC_STATUS_REG) &=
            !(DPC_STATUS_PIPE_BUSY | DPC_STATUS_CMD_BUSY | DPC_STATUS_START_GCLK);
        mi.raise(MiIntr::DP, &mut r4300.cp0);
    }

    fn update_status(&mut self, command: u32) {
        apply_set_clear(
            self.dpc_regs.get_mut(DPC_STATUS_REG),
            command,
            &[
                (0x001, 0x002, DPC_STATUS_XBUS_DMEM_DMA),
                (0x004, 0x008, DPC_STATUS_FREEZE),
                (0x010, 0x020, DPC_STATUS_FLUSH),
            ],
        );
        if command & 0x040 != 0 {
            self.dpc_regs.set(DPC_TMEM_REG, 0);
        }
        if command & 0x080 != 0 {
            self.dpc_regs.set(DPC_PIPEBUSY_REG, 0);
        }
        if command & 0x100 != 0 {
            self.dpc_regs.set(DPC_BUFBUSY_REG, 0);
        }
        if command & 0x200 != 0 {
            self.dpc_regs.set(DPC_CLOCK_REG, 0);
        }
    }

    /// Consume START..END and schedule the interrupt if a full sync is found
    fn process_list(&mut self, dram: &[u8], dmem: &[u8], r4300: &mut R4300) {
        if self.status() & DPC_STATUS_START_VALID != 0 {
            let start = self.dpc_regs.get(DPC_START_REG);
            self.dpc_regs.set(DPC_CURRENT_REG, start);
            *self.dpc_regs.get_mut(DPC_STATUS_REG) &= !DPC_STATUS_START_VALID;
        }

        let current = self.dpc_regs.get(DPC_CURRENT_REG);
        let end = self.dpc_regs.get(DPC_END_REG);
        if end <= current || self.status() & DPC_STATUS_FREEZE != 0 {
            return;
        }

        let (source, wrap) = if self.status() & DPC_STATUS_XBUS_DMEM_DMA != 0 {
            (dmem, 0xFFF)
        } else {
            (dram, u32::MAX)
        };

        let mut sync = false;
        let mut address = current;
        while address < end {
            let word = read_be_word(source, (address & wrap) as usize).unwrap_or(0);
            let id = (word >> 24) & 0x3F;
            if id == RDP_CMD_SYNC_FULL {
                sync = true;
            }
            address += command_words(id) * 8;
        }

        self.dpc_regs.set(DPC_CURRENT_REG, end);
        *self.dpc_regs.get_mut(DPC_STATUS_REG) |= DPC_STATUS_PIPE_BUSY | DPC_STATUS_CMD_BUSY;

        if sync {
            let cycles = ((end - current) as u64 / 8).max(1);
            r4300.events.remove(InterruptKind::Dp);
            r4300.schedule(InterruptKind::Dp, cycles);
        }
    }
}

impl Default for Rdp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DPC_START_ADDR: u32 = 0x0410_0000;
    const DPC_END_ADDR: u32 = 0x0410_0004;
    const DPC_CURRENT_ADDR: u32 = 0x0410_0008;
    const DPC_STATUS_ADDR: u32 = 0x0410_000C;

    fn command(id: u32) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&(id << 24).to_be_bytes());
        bytes
    }

    struct Fixture {
        dp: Rdp,
        dram: Vec<u8>,
        dmem: Vec<u8>,
        mi: MiController,
        r4300: R4300,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dp: Rdp::new(),
                dram: vec![0; 0x1000],
                dmem: vec![0; 0x2000],
                mi: MiController::new(),
                r4300: R4300::new(2),
            }
        }

        fn write(&mut self, address: u32, value: u32) {
            self.dp.write_dpc(
                address,
                value,
                0xFFFF_FFFF,
                &self.dram,
                &self.dmem,
                &mut self.r4300,
            );
        }
    }

    #[test]
    fn test_list_with_full_sync_schedules_interrupt() {
        let mut f = Fixture::new();
        // fill triangle (4 words) whose data words contain 0x29, then sync full
        let mut triangle = [0u8; 32];
        triangle[..4].copy_from_slice(&(0x08u32 << 24).to_be_bytes());
        triangle[8] = 0x29;
        f.dram[0x100..0x120].copy_from_slice(&triangle);
        f.dram[0x120..0x128].copy_from_slice(&command(RDP_CMD_SYNC_FULL));

        f.write(DPC_START_ADDR, 0x100);
        f.write(DPC_END_ADDR, 0x128);

        assert_eq!(f.dp.read_dpc(DPC_CURRENT_ADDR), 0x128);
        assert_eq!(f.dp.status() & DPC_STATUS_START_VALID, 0);
        assert_eq!(f.r4300.events.time_of(InterruptKind::Dp), Some(5));

        f.dp.full_sync(&mut f.mi, &mut f.r4300);
        assert!(f.mi.intr().contains(MiIntr::DP));
    }

    #[test]
    fn test_list_without_sync_is_silent() {
        let mut f = Fixture::new();
        f.dram[0x100..0x108].copy_from_slice(&command(0x27));
        // the second word of the texture rectangle is data, not a command
        f.dram[0x108..0x110].copy_from_slice(&command(0x24));
        f.dram[0x110..0x118].copy_from_slice(&command(RDP_CMD_SYNC_FULL));

        f.write(DPC_START_ADDR, 0x100);
        f.write(DPC_END_ADDR, 0x118);

        assert!(f.r4300.events.is_empty());
    }

    #[test]
    fn test_start_latched_while_valid() {
        let mut f = Fixture::new();

        f.write(DPC_START_ADDR, 0x200);
        f.write(DPC_START_ADDR, 0x300);

        assert_eq!(f.dp.read_dpc(DPC_START_ADDR), 0x200);
    }

    #[test]
    fn test_xbus_reads_dmem() {
        let mut f = Fixture::new();
        f.dmem[0x40..0x48].copy_from_slice(&command(RDP_CMD_SYNC_FULL));

        f.write(DPC_STATUS_ADDR, 0x002);
        f.write(DPC_START_ADDR, 0x40);
        f.write(DPC_END_ADDR, 0x48);

        assert!(f.r4300.events.time_of(InterruptKind::Dp).is_some());
    }

    #[test]
    fn test_status_counters_cleared() {
        let mut f = Fixture::new();
        f.dp.dpc_regs.set(DPC_CLOCK_REG, 55);
        f.dp.dpc_regs.set(DPC_TMEM_REG, 66);

        f.write(DPC_STATUS_ADDR, 0x040 | 0x200);

        assert_eq!(f.dp.dpc_regs.get(DPC_CLOCK_REG), 0);
        assert_eq!(f.dp.dpc_regs.get(DPC_TMEM_REG), 0);
    }
}
