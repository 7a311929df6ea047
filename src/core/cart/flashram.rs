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

//! Cartridge FlashRAM
//!
//! 128 KiB of flash driven by commands written to 0x08010000. The command
//! is selected by the top byte of the written word:
//!
//! | Command | Effect                                           |
//! |---------|--------------------------------------------------|
//! | 0x4B    | sector erase setup, sector = low half * 128      |
//! | 0x78    | chip erase setup                                 |
//! | 0xA5    | page program setup, page = low half * 128        |
//! | 0xB4    | enter write mode (DMA fills the page buffer)     |
//! | 0xD2    | execute the pending erase or program             |
//! | 0xE1    | enter status mode                                |
//! | 0xF0    | enter read mode                                  |
//!
//! In read mode, DMA from cartridge address `a` reads flash offset
//! `(a & 0x1FFFF) * 2`.

use crate::core::backend::StorageBackend;
use crate::core::memory::layout::FLASHRAM_SIZE;
use crate::core::rdram::Rdram;

/// Bytes in one erase sector / program page
pub const FLASHRAM_PAGE_SIZE: usize = 128;

/// Silicon id reported in status mode
pub const FLASHRAM_SILICON_ID: u64 = 0x1111_8001_00C2_001E;

/// Status after an erase or program completes
const FLASHRAM_STATUS_DONE: u64 = 0x1111_8008_00C2_001E;

/// Status while an erase or program is set up
const FLASHRAM_STATUS_BUSY: u64 = 0x1111_8004_00C2_001E;

/// Operating mode selected by the last command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Read,
    Status,
    SectorErase,
    ChipErase,
    Write,
}

/// Cartridge FlashRAM
pub struct FlashRam {
    data: Box<[u8]>,
    page_buf: [u8; FLASHRAM_PAGE_SIZE],
    status: u64,
    mode: FlashMode,
    /// Target of the pending erase or program
    offset: usize,
    storage: Box<dyn StorageBackend>,
}

impl FlashRam {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            data: vec![0xFFu8; FLASHRAM_SIZE].into_boxed_slice(),
            page_buf: [0xFF; FLASHRAM_PAGE_SIZE],
            status: 0,
            mode: FlashMode::Read,
            offset: 0,
            storage,
        }
    }

    /// Reload contents from storage and return to read mode
    pub fn poweron(&mut self) {
        self.data.fill(0xFF);
        self.storage.load(&mut self.data);
        self.page_buf.fill(0xFF);
        self.status = 0;
        self.mode = FlashMode::Read;
        self.offset = 0;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mode(&self) -> FlashMode {
        self.mode
    }

    /// Read half of the 64-bit status register
    pub fn read_status(&self, address: u32) -> u32 {
        if address & 4 == 0 {
            (self.status >> 32) as u32
        } else {
            self.status as u32
        }
    }

    /// Execute a command word
    pub fn write_command(&mut self, command: u32) {
        match command >> 24 {
            0x4B => {
                self.mode = FlashMode::SectorErase;
                self.offset = (command & 0xFFFF) as usize * FLASHRAM_PAGE_SIZE;
                self.status = FLASHRAM_STATUS_BUSY;
            }
            0x78 => {
                self.mode = FlashMode::ChipErase;
                self.status = FLASHRAM_STATUS_BUSY;
            }
            0xA5 => {
                self.offset = (command & 0xFFFF) as usize * FLASHRAM_PAGE_SIZE;
                self.status = FLASHRAM_STATUS_BUSY;
            }
            0xB4 => self.mode = FlashMode::Write,
            0xD2 => self.execute(),
            0xE1 => {
                self.mode = FlashMode::Status;
                self.status = FLASHRAM_SILICON_ID;
            }
            0xF0 => {
                self.mode = FlashMode::Read;
                self.status = FLASHRAM_SILICON_ID;
            }
            _ => log::warn!("FlashRAM: unknown command 0x{:08X}", command),
        }
    }

    fn execute(&mut self) {
        match self.mode {
            FlashMode::SectorErase => {
                let end = self.offset + FLASHRAM_PAGE_SIZE;
                if let Some(sector) = self.data.get_mut(self.offset..end) {
                    sector.fill(0xFF);
                }
            }
            FlashMode::ChipErase => self.data.fill(0xFF),
            FlashMode::Write => {
                let end = self.offset + FLASHRAM_PAGE_SIZE;
                if let Some(page) = self.data.get_mut(self.offset..end) {
                    page.copy_from_slice(&self.page_buf);
                }
            }
            mode => {
                log::warn!("FlashRAM: execute in {:?} mode ignored", mode);
                return;
            }
        }
        self.status = FLASHRAM_STATUS_DONE;
        self.storage.save(&self.data);
    }

    /// PI transfer FlashRAM to RDRAM
    pub fn dma_to_dram(
        &self,
        cart_address: u32,
        rdram: &mut Rdram,
        dram_address: u32,
        length: u32,
    ) {
        match self.mode {
            FlashMode::Status => {
                rdram.copy_in(dram_address as usize, &self.status.to_be_bytes());
            }
            FlashMode::Read => {
                let offset = ((cart_address & 0x1_FFFF) * 2) as usize;
                let end = (offset + length as usize).min(FLASHRAM_SIZE);
                if let Some(src) = self.data.get(offset..end) {
                    rdram.copy_in(dram_address as usize, src);
                }
            }
            mode => log::warn!("FlashRAM: read DMA in {:?} mode ignored", mode),
        }
    }

    /// PI transfer RDRAM to the FlashRAM page buffer
    pub fn dma_from_dram(&mut self, rdram: &Rdram, dram_address: u32, length: u32) {
        if self.mode != FlashMode::Write {
            log::warn!("FlashRAM: write DMA in {:?} mode ignored", self.mode);
            return;
        }
        let len = (length as usize).min(FLASHRAM_PAGE_SIZE);
        rdram.copy_out(dram_address as usize, &mut self.page_buf[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn flashram() -> FlashRam {
        let mut flash = FlashRam::new(Box::new(MemoryStorage::new()));
        flash.poweron();
        flash
    }

    #[test]
    fn test_erased_after_poweron() {
        let flash = flashram();
        assert!(flash.data().iter().all(|&b| b == 0xFF));
        assert_eq!(flash.mode(), FlashMode::Read);
    }

    #[test]
    fn test_status_mode_reports_silicon_id() {
        let mut flash = flashram();
        let mut rdram = Rdram::new(0x1000);

        flash.write_command(0xE100_0000);
        flash.dma_to_dram(0x0800_0000, &mut rdram, 0x10, 8);

        assert_eq!(flash.read_status(0x0800_0000), 0x1111_8001);
        assert_eq!(flash.read_status(0x0800_0004), 0x00C2_001E);
        assert_eq!(&rdram.dram()[0x10..0x18], &FLASHRAM_SILICON_ID.to_be_bytes());
    }

    #[test]
    fn test_program_page() {
        let mut flash = flashram();
        let mut rdram = Rdram::new(0x1000);
        rdram.copy_in(0x100, &[0x5A; FLASHRAM_PAGE_SIZE]);

        flash.write_command(0xB400_0000);
        flash.dma_from_dram(&rdram, 0x100, FLASHRAM_PAGE_SIZE as u32);
        flash.write_command(0xA500_0002);
        flash.write_command(0xD200_0000);

        assert_eq!(&flash.data()[0x100..0x180], &[0x5A; FLASHRAM_PAGE_SIZE]);
        assert_eq!(flash.data()[0x180], 0xFF);
        assert_eq!(flash.read_status(0x0800_0004), FLASHRAM_STATUS_DONE as u32);

        // read back page 2: cartridge offset is half the flash offset
        flash.write_command(0xF000_0000);
        flash.dma_to_dram(0x0800_0080, &mut rdram, 0x400, 4);
        assert_eq!(&rdram.dram()[0x400..0x404], &[0x5A; 4]);
    }

    #[test]
    fn test_sector_erase() {
        let mut flash = flashram();
        let rdram = Rdram::new(0x1000);
        flash.write_command(0xB400_0000);
        flash.dma_from_dram(&rdram, 0, FLASHRAM_PAGE_SIZE as u32);
        flash.write_command(0xA500_0001);
        flash.write_command(0xD200_0000);
        assert_eq!(flash.data()[0x80], 0);

        flash.write_command(0x4B00_0001);
        flash.write_command(0xD200_0000);

        assert!(flash.data()[0x80..0x100].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_execute_saves_to_storage() {
        struct Shared(Rc<RefCell<MemoryStorage>>);

        impl StorageBackend for Shared {
            fn load(&mut self, buf: &mut [u8]) {
                self.0.borrow_mut().load(buf);
            }

            fn save(&mut self, data: &[u8]) {
                self.0.borrow_mut().save(data);
            }
        }

        let storage = Rc::new(RefCell::new(MemoryStorage::new()));
        let mut flash = FlashRam::new(Box::new(Shared(Rc::clone(&storage))));
        flash.poweron();

        flash.write_command(0x7800_0000);
        flash.write_command(0xD200_0000);

        assert_eq!(storage.borrow().saves, 1);
        assert_eq!(storage.borrow().data.len(), FLASHRAM_SIZE);
    }

    #[test]
    fn test_execute_without_setup_is_ignored() {
        let mut flash = flashram();

        flash.write_command(0xD200_0000);

        assert_eq!(flash.read_status(0x0800_0000), 0);
    }
}
