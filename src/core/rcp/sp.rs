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

//! Signal Processor (SP) interface
//!
//! DMEM/IMEM, the SP DMA engine and the status register. Microcode is not
//! executed: un-halting the SP runs a task of fixed length, after which the
//! SP halts with the break bit set and raises its interrupt if enabled.
//!
//! ## Memory Layout
//!
//! ```text
//! 0x04000000 - 0x04000FFF  DMEM (4 KiB)
//! 0x04001000 - 0x04001FFF  IMEM (4 KiB)
//! ```
//!
//! ## DMA Length Register
//!
//! ```text
//! 31      20 19     12 11       0
//! ┌─────────┬─────────┬──────────┐
//! │  skip   │  count  │  length  │
//! └─────────┴─────────┴──────────┘
//! bytes per row = (length | 7) + 1, rows = count + 1
//! ```

use super::apply_set_clear;
use super::mi::{MiController, MiIntr};
use crate::core::memory::layout::{SP_MEM_SIZE, SP_REGS2_COUNT, SP_REGS_COUNT};
use crate::core::memory::{read_be_word, write_be_word, MemoryHandler, RegisterFile};
use crate::core::r4300::{InterruptKind, R4300};
use crate::core::rdram::Rdram;

pub const SP_MEM_ADDR_REG: usize = 0;
pub const SP_DRAM_ADDR_REG: usize = 1;
pub const SP_RD_LEN_REG: usize = 2;
pub const SP_WR_LEN_REG: usize = 3;
pub const SP_STATUS_REG: usize = 4;
pub const SP_DMA_FULL_REG: usize = 5;
pub const SP_DMA_BUSY_REG: usize = 6;
pub const SP_SEMAPHORE_REG: usize = 7;

pub const SP_PC_REG: usize = 0;
pub const SP_IBIST_REG: usize = 1;

pub const SP_STATUS_HALT: u32 = 0x0001;
pub const SP_STATUS_BROKE: u32 = 0x0002;
pub const SP_STATUS_DMA_BUSY: u32 = 0x0004;
pub const SP_STATUS_DMA_FULL: u32 = 0x0008;
pub const SP_STATUS_IO_FULL: u32 = 0x0010;
pub const SP_STATUS_SSTEP: u32 = 0x0020;
pub const SP_STATUS_INTR_BREAK: u32 = 0x0040;

/// Signal bit `n` (0-7) of the status register
const fn sp_status_sig(n: u32) -> u32 {
    0x80 << n
}

/// Cycles an SP task runs before halting
pub const RSP_TASK_CYCLES: u64 = 1000;

/// Signal processor interface
pub struct Rsp {
    /// DMEM followed by IMEM (big-endian)
    mem: Box<[u8]>,
    pub regs: RegisterFile<SP_REGS_COUNT>,
    pub regs2: RegisterFile<SP_REGS2_COUNT>,
}

impl Rsp {
    pub fn new() -> Self {
        let mut sp = Self {
            mem: vec![0u8; SP_MEM_SIZE].into_boxed_slice(),
            regs: RegisterFile::new(),
            regs2: RegisterFile::new(),
        };
        sp.poweron();
        sp
    }

    /// Clear memories and registers; the SP starts halted
    pub fn poweron(&mut self) {
        self.mem.fill(0);
        self.regs.reset();
        self.regs2.reset();
        self.regs.set(SP_STATUS_REG, SP_STATUS_HALT);
    }

    /// DMEM + IMEM bytes
    pub fn mem(&self) -> &[u8] {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut [u8] {
        &mut self.mem
    }

    pub fn status(&self) -> u32 {
        self.regs.get(SP_STATUS_REG)
    }

    pub fn read_mem(&self, address: u32) -> u32 {
        read_be_word(&self.mem, (address & 0x1FFC) as usize).unwrap_or(0)
    }

    pub fn write_mem(&mut self, address: u32, value: u32, mask: u32) {
        write_be_word(&mut self.mem, (address & 0x1FFC) as usize, value, mask);
    }

    /// Read an SP register; reading the semaphore acquires it
    pub fn read_regs(&mut self, address: u32) -> u32 {
        match RegisterFile::<SP_REGS_COUNT>::index(address) {
            SP_SEMAPHORE_REG => {
                let value = self.regs.get(SP_SEMAPHORE_REG);
                self.regs.set(SP_SEMAPHORE_REG, 1);
                value
            }
            _ => self.regs.read_word(address),
        }
    }

    /// Write an SP register
    pub fn write_regs(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        rdram: &mut Rdram,
        mi: &mut MiController,
        r4300: &mut R4300,
    ) {
        match RegisterFile::<SP_REGS_COUNT>::index(address) {
            reg @ (SP_RD_LEN_REG | SP_WR_LEN_REG) => {
                self.regs.write_word(address, value, mask);
                let cycles = self.dma(rdram, reg == SP_WR_LEN_REG);
                r4300.schedule(InterruptKind::RspDma, cycles);
            }
            SP_STATUS_REG => self.update_status(value & mask, mi, r4300),
            SP_SEMAPHORE_REG => self.regs.set(SP_SEMAPHORE_REG, 0),
            SP_DMA_FULL_REG | SP_DMA_BUSY_REG => {}
            _ => self.regs.write_word(address, value, mask),
        }
    }

    pub fn read_regs2(&mut self, address: u32) -> u32 {
        self.regs2.read_word(address)
    }

    pub fn write_regs2(&mut self, address: u32, value: u32, mask: u32) {
        match RegisterFile::<SP_REGS2_COUNT>::index(address) {
            SP_PC_REG => {
                self.regs2.write_word(address, value, mask);
                *self.regs2.get_mut(SP_PC_REG) &= 0xFFC;
            }
            _ => self.regs2.write_word(address, value, mask),
        }
    }

    /// SP task finished: halt with break and raise SP if enabled
    pub fn task_done(&mut self, mi: &mut MiController, r4300: &mut R4300) {
        let status = self.regs.get_mut(SP_STATUS_REG);
        *status |= SP_STATUS_HALT | SP_STATUS_BROKE;
        if *status & SP_STATUS_INTR_BREAK != 0 {
            mi.raise(MiIntr::SP, &mut r4300.cp0);
        }
    }

    /// SP DMA finished
    pub fn end_of_dma(&mut self) {
        *self.regs.get_mut(SP_STATUS_REG) &= !(SP_STATUS_DMA_BUSY | SP_STATUS_DMA_FULL);
        self.regs.set(SP_DMA_BUSY_REG, 0);
        self.regs.set(SP_DMA_FULL_REG, 0);
    }

    fn update_status(&mut self, command: u32, mi: &mut MiController, r4300: &mut R4300) {
        let was_halted = self.status() & SP_STATUS_HALT != 0;

        let mut pairs: Vec<(u32, u32, u32)> = vec![
            (0x0001, 0x0002, SP_STATUS_HALT),
            (0x0004, 0, SP_STATUS_BROKE),
            (0x0020, 0x0040, SP_STATUS_SSTEP),
            (0x0080, 0x0100, SP_STATUS_INTR_BREAK),
        ];
        pairs.extend((0..8).map(|n| (0x200 << (2 * n), 0x400 << (2 * n), sp_status_sig(n))));
        apply_set_clear(self.regs.get_mut(SP_STATUS_REG), command, &pairs);

        if command & 0x0008 != 0 {
            mi.clear(MiIntr::SP, &mut r4300.cp0);
        }
        if command & 0x0010 != 0 {
            mi.raise(MiIntr::SP, &mut r4300.cp0);
        }

        if was_halted && self.status() & SP_STATUS_HALT == 0 {
            log::trace!("SP: task started at PC 0x{:03X}", self.regs2.get(SP_PC_REG));
            r4300.events.remove(InterruptKind::Sp);
            r4300.schedule(InterruptKind::Sp, RSP_TASK_CYCLES);
        }
    }

    /// Run one SP DMA immediately
    ///
    /// # Returns
    ///
    /// Cycles until the transfer is reported finished
    fn dma(&mut self, rdram: &mut Rdram, to_dram: bool) -> u64 {
        let l = if to_dram {
            self.regs.get(SP_WR_LEN_REG)
        } else {
            self.regs.get(SP_RD_LEN_REG)
        };

        let length = ((l & 0xFFF) | 7) + 1;
        let count = ((l >> 12) & 0xFF) + 1;
        let skip = l >> 20;

        let mem_addr = self.regs.get(SP_MEM_ADDR_REG) & 0x1FF8;
        let bank = mem_addr & 0x1000;
        let mut offset = mem_addr & 0xFFF;
        let mut dram_addr = self.regs.get(SP_DRAM_ADDR_REG) & 0xFF_FFF8;

        for _ in 0..count {
            for j in 0..length {
                let m = (bank | ((offset + j) & 0xFFF)) as usize;
                let d = (dram_addr + j) as usize;
                if to_dram {
                    if let Some(byte) = rdram.dram_mut().get_mut(d) {
                        *byte = self.mem[m];
                    }
                } else {
                    self.mem[m] = rdram.dram().get(d).copied().unwrap_or(0);
                }
            }
            offset = (offset + length) & 0xFFF;
            dram_addr += length + skip;
        }

        self.regs.set(SP_MEM_ADDR_REG, bank | offset);
        self.regs.set(SP_DRAM_ADDR_REG, dram_addr);
        *self.regs.get_mut(SP_STATUS_REG) |= SP_STATUS_DMA_BUSY;
        self.regs.set(SP_DMA_BUSY_REG, 1);

        ((length * count) as u64 / 8).max(1)
    }
}

impl Default for Rsp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SP_MEM_ADDR_ADDR: u32 = 0x0404_0000;
    const SP_DRAM_ADDR_ADDR: u32 = 0x0404_0004;
    const SP_RD_LEN_ADDR: u32 = 0x0404_0008;
    const SP_WR_LEN_ADDR: u32 = 0x0404_000C;
    const SP_STATUS_ADDR: u32 = 0x0404_0010;
    const SP_SEMAPHORE_ADDR: u32 = 0x0404_001C;

    struct Fixture {
        sp: Rsp,
        rdram: Rdram,
        mi: MiController,
        r4300: R4300,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sp: Rsp::new(),
                rdram: Rdram::new(0x1_0000),
                mi: MiController::new(),
                r4300: R4300::new(2),
            }
        }

        fn write(&mut self, address: u32, value: u32) {
            self.sp.write_regs(
                address,
                value,
                0xFFFF_FFFF,
                &mut self.rdram,
                &mut self.mi,
                &mut self.r4300,
            );
        }
    }

    #[test]
    fn test_starts_halted() {
        let sp = Rsp::new();
        assert_eq!(sp.status(), SP_STATUS_HALT);
    }

    #[test]
    fn test_mem_access() {
        let mut sp = Rsp::new();
        sp.write_mem(0x0400_1004, 0xCAFE_BABE, 0xFFFF_FFFF);

        assert_eq!(sp.read_mem(0x0400_1004), 0xCAFE_BABE);
        assert_eq!(&sp.mem()[0x1004..0x1008], &[0xCA, 0xFE, 0xBA, 0xBE]);
    }

    #[test]
    fn test_dma_rdram_to_dmem() {
        let mut f = Fixture::new();
        f.rdram.copy_in(0x2000, &[0x11; 16]);

        f.write(SP_MEM_ADDR_ADDR, 0x0400_0100);
        f.write(SP_DRAM_ADDR_ADDR, 0x2000);
        f.write(SP_RD_LEN_ADDR, 0xF);

        assert_eq!(&f.sp.mem()[0x100..0x110], &[0x11; 16]);
        assert_eq!(f.sp.mem()[0x110], 0);
        assert_ne!(f.sp.status() & SP_STATUS_DMA_BUSY, 0);
        assert!(f.r4300.events.time_of(InterruptKind::RspDma).is_some());

        f.sp.end_of_dma();
        assert_eq!(f.sp.status() & SP_STATUS_DMA_BUSY, 0);
    }

    #[test]
    fn test_dma_rows_with_skip() {
        let mut f = Fixture::new();
        f.sp.mem_mut()[..16].copy_from_slice(&[0x22; 16]);

        f.write(SP_DRAM_ADDR_ADDR, 0x100);
        // two rows of 8 bytes, skipping 8 bytes in RDRAM between them
        f.write(SP_WR_LEN_ADDR, (8 << 20) | (1 << 12) | 7);

        assert_eq!(&f.rdram.dram()[0x100..0x108], &[0x22; 8]);
        assert_eq!(&f.rdram.dram()[0x108..0x110], &[0; 8]);
        assert_eq!(&f.rdram.dram()[0x110..0x118], &[0x22; 8]);
    }

    #[test]
    fn test_unhalt_runs_task() {
        let mut f = Fixture::new();
        // clear halt, set interrupt on break
        f.write(SP_STATUS_ADDR, 0x0001 | 0x0100);

        assert_eq!(f.sp.status(), SP_STATUS_INTR_BREAK);
        assert_eq!(
            f.r4300.events.time_of(InterruptKind::Sp),
            Some(RSP_TASK_CYCLES)
        );

        f.sp.task_done(&mut f.mi, &mut f.r4300);
        assert_eq!(
            f.sp.status(),
            SP_STATUS_HALT | SP_STATUS_BROKE | SP_STATUS_INTR_BREAK
        );
        assert!(f.mi.intr().contains(MiIntr::SP));
    }

    #[test]
    fn test_status_signals_and_interrupt_pairs() {
        let mut f = Fixture::new();

        // set signal 0 and signal 7, raise SP interrupt
        f.write(SP_STATUS_ADDR, 0x400 | (0x400 << 14) | 0x0010);
        assert_eq!(
            f.sp.status(),
            SP_STATUS_HALT | sp_status_sig(0) | sp_status_sig(7)
        );
        assert!(f.mi.intr().contains(MiIntr::SP));

        f.write(SP_STATUS_ADDR, 0x200 | 0x0008);
        assert_eq!(f.sp.status(), SP_STATUS_HALT | sp_status_sig(7));
        assert!(f.mi.intr().is_empty());
    }

    #[test]
    fn test_semaphore() {
        let mut f = Fixture::new();

        assert_eq!(f.sp.read_regs(SP_SEMAPHORE_ADDR), 0);
        assert_eq!(f.sp.read_regs(SP_SEMAPHORE_ADDR), 1);

        f.write(SP_SEMAPHORE_ADDR, 0x1234);
        assert_eq!(f.sp.read_regs(SP_SEMAPHORE_ADDR), 0);
    }
}
