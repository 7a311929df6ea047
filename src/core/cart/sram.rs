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

//! Battery-backed cartridge SRAM

use crate::core::backend::StorageBackend;
use crate::core::memory::layout::SRAM_SIZE;
use crate::core::memory::{read_be_word, write_be_word};
use crate::core::rdram::Rdram;

const SRAM_ADDR_MASK: u32 = (SRAM_SIZE as u32) - 1;

/// 32 KiB SRAM; every change is handed to the storage backend
pub struct Sram {
    data: Box<[u8]>,
    storage: Box<dyn StorageBackend>,
}

impl Sram {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            data: vec![0u8; SRAM_SIZE].into_boxed_slice(),
            storage,
        }
    }

    /// Reload contents from storage
    pub fn poweron(&mut self) {
        self.data.fill(0);
        self.storage.load(&mut self.data);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn read(&self, address: u32) -> u32 {
        read_be_word(&self.data, (address & SRAM_ADDR_MASK & !3) as usize).unwrap_or(0)
    }

    pub fn write(&mut self, address: u32, value: u32, mask: u32) {
        write_be_word(&mut self.data, (address & SRAM_ADDR_MASK & !3) as usize, value, mask);
        self.storage.save(&self.data);
    }

    /// PI transfer SRAM to RDRAM
    pub fn dma_to_dram(
        &self,
        cart_address: u32,
        rdram: &mut Rdram,
        dram_address: u32,
        length: u32,
    ) {
        let offset = (cart_address & SRAM_ADDR_MASK) as usize;
        let end = (offset + length as usize).min(SRAM_SIZE);
        rdram.copy_in(dram_address as usize, &self.data[offset..end]);
    }

    /// PI transfer RDRAM to SRAM
    pub fn dma_from_dram(
        &mut self,
        cart_address: u32,
        rdram: &Rdram,
        dram_address: u32,
        length: u32,
    ) {
        let offset = (cart_address & SRAM_ADDR_MASK) as usize;
        let end = (offset + length as usize).min(SRAM_SIZE);
        rdram.copy_out(dram_address as usize, &mut self.data[offset..end]);
        self.storage.save(&self.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::MemoryStorage;

    #[test]
    fn test_poweron_loads_storage() {
        let mut sram = Sram::new(Box::new(MemoryStorage::with_data(vec![0xAB; 4])));

        sram.poweron();

        assert_eq!(sram.read(0x0800_0000), 0xABAB_ABAB);
        assert_eq!(sram.read(0x0800_0004), 0);
    }

    #[test]
    fn test_address_wraps() {
        let mut sram = Sram::new(Box::new(MemoryStorage::new()));

        sram.write(0x0800_8010, 0x1122_3344, 0xFFFF_FFFF);

        assert_eq!(sram.read(0x0800_0010), 0x1122_3344);
    }

    #[test]
    fn test_dma_round_trip_through_rdram() {
        let mut sram = Sram::new(Box::new(MemoryStorage::new()));
        let mut rdram = Rdram::new(0x1000);
        rdram.copy_in(0x100, &[1, 2, 3, 4, 5, 6, 7, 8]);

        sram.dma_from_dram(0x0800_0020, &rdram, 0x100, 8);
        sram.dma_to_dram(0x0800_0024, &mut rdram, 0x200, 4);

        assert_eq!(&sram.data()[0x20..0x28], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&rdram.dram()[0x200..0x204], &[5, 6, 7, 8]);
    }

    #[test]
    fn test_dma_clipped_at_end() {
        let mut sram = Sram::new(Box::new(MemoryStorage::new()));
        let rdram = Rdram::new(0x1000);

        sram.dma_from_dram(0x0800_7FFC, &rdram, 0, 0x100);

        assert_eq!(sram.data().len(), SRAM_SIZE);
    }
}
