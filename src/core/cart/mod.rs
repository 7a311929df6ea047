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

//! Game cartridge
//!
//! ROM on DOM1 addr2, save media on DOM2 addr2 and an empty DOM3 window.
//!
//! ## Save Media Detection
//!
//! SRAM and FlashRAM share the DOM2 addr2 window. With
//! [`SaveType::Auto`] the first access decides: touching the FlashRAM
//! status/command words (offset 0 of a 64 KiB block) selects FlashRAM,
//! anything else selects SRAM. A configured type is never overridden.
//!
//! ## ROM Write Latch
//!
//! A write to ROM space is latched and returned by the next ROM read,
//! mimicking the bus hold of the real cartridge.

pub mod flashram;
pub mod sram;

pub use flashram::{FlashMode, FlashRam};
pub use sram::Sram;

use crate::core::backend::StorageBackend;
use crate::core::config::SaveType;
use crate::core::memory::layout::CART_ROM;
use crate::core::memory::read_be_word;
use crate::core::rdram::Rdram;

/// Game cartridge
pub struct Cart {
    rom: Vec<u8>,

    /// Value of the last ROM write, returned by the next ROM read
    rom_latch: Option<u32>,

    pub sram: Sram,
    pub flashram: FlashRam,

    /// Configured save type
    save_type: SaveType,

    /// Save media in use, refined from `save_type` at runtime
    active_save: SaveType,
}

impl Cart {
    pub fn new(
        rom: Vec<u8>,
        save_type: SaveType,
        sram_storage: Box<dyn StorageBackend>,
        flashram_storage: Box<dyn StorageBackend>,
    ) -> Self {
        Self {
            rom,
            rom_latch: None,
            sram: Sram::new(sram_storage),
            flashram: FlashRam::new(flashram_storage),
            save_type,
            active_save: save_type,
        }
    }

    /// Reload save media and forget runtime detection
    pub fn poweron(&mut self) {
        self.rom_latch = None;
        self.active_save = self.save_type;
        self.sram.poweron();
        self.flashram.poweron();
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Save media in use
    pub fn active_save(&self) -> SaveType {
        self.active_save
    }

    /// Read a ROM word; a pending latched write is returned instead
    pub fn read_rom(&mut self, address: u32) -> u32 {
        if let Some(value) = self.rom_latch.take() {
            return value;
        }
        read_be_word(&self.rom, ((address - CART_ROM) & !3) as usize).unwrap_or(0)
    }

    pub fn write_rom(&mut self, address: u32, value: u32, mask: u32) {
        log::trace!("Cart: ROM write at 0x{:08X} latched", address);
        self.rom_latch = Some(value & mask);
    }

    /// Read the DOM2 addr2 window
    pub fn read_dom2(&mut self, address: u32) -> u32 {
        match self.route_dom2(address) {
            SaveType::FlashRam => self.flashram.read_status(address),
            _ => self.sram.read(address),
        }
    }

    /// Write the DOM2 addr2 window
    pub fn write_dom2(&mut self, address: u32, value: u32, mask: u32) {
        match self.route_dom2(address) {
            SaveType::FlashRam => self.flashram.write_command(value & mask),
            _ => self.sram.write(address, value, mask),
        }
    }

    /// Pick the save media answering a DOM2 access, detecting it under `Auto`
    fn route_dom2(&mut self, address: u32) -> SaveType {
        if self.save_type != SaveType::Auto {
            return self.save_type;
        }
        self.active_save = if self.active_save != SaveType::Sram && address & 0xFFFF == 0 {
            SaveType::FlashRam
        } else {
            SaveType::Sram
        };
        self.active_save
    }

    /// PI transfer save media to RDRAM
    pub fn dom2_dma_to_dram(
        &mut self,
        cart_address: u32,
        rdram: &mut Rdram,
        dram_address: u32,
        length: u32,
    ) {
        if self.active_save == SaveType::FlashRam {
            self.flashram.dma_to_dram(cart_address, rdram, dram_address, length);
        } else {
            self.sram.dma_to_dram(cart_address, rdram, dram_address, length);
        }
    }

    /// PI transfer RDRAM to save media
    pub fn dom2_dma_from_dram(
        &mut self,
        cart_address: u32,
        rdram: &Rdram,
        dram_address: u32,
        length: u32,
    ) {
        if self.active_save == SaveType::FlashRam {
            self.flashram.dma_from_dram(rdram, dram_address, length);
        } else {
            self.sram.dma_from_dram(cart_address, rdram, dram_address, length);
        }
    }

    /// PI transfer ROM to RDRAM, clipped to the ROM image
    pub fn rom_dma_to_dram(
        &self,
        cart_address: u32,
        rdram: &mut Rdram,
        dram_address: u32,
        length: u32,
    ) {
        let offset = (cart_address - CART_ROM) as usize;
        let Some(src) = self.rom.get(offset..) else {
            log::debug!("Cart: ROM DMA past end of image at 0x{:08X}", cart_address);
            return;
        };
        let len = src.len().min(length as usize);
        rdram.copy_in(dram_address as usize, &src[..len]);
    }
}
