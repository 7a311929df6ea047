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

//! RDRAM controller
//!
//! Main memory plus the RDRAM configuration register file. Memory is stored
//! big-endian, one byte per address, so DMA engines copy byte ranges without
//! any swapping.
//!
//! The RDRAM window is 0x03F00000 bytes wide; only the populated part (4 or
//! 8 MiB) holds data. Reads above it return 0 and writes are dropped.

use crate::core::memory::layout::RDRAM_REGS_COUNT;
use crate::core::memory::{read_be_word, write_be_word, RegisterFile};

/// RDRAM controller
pub struct Rdram {
    /// Main memory (big-endian)
    dram: Vec<u8>,

    /// RDRAM configuration registers (one module)
    pub regs: RegisterFile<RDRAM_REGS_COUNT>,
}

impl Rdram {
    /// Create an RDRAM controller with `dram_size` bytes populated
    pub fn new(dram_size: usize) -> Self {
        Self {
            dram: vec![0; dram_size],
            regs: RegisterFile::new(),
        }
    }

    /// Clear memory and registers
    pub fn poweron(&mut self) {
        self.dram.fill(0);
        self.regs.reset();
    }

    /// Populated size in bytes
    pub fn size(&self) -> usize {
        self.dram.len()
    }

    /// Read a word of main memory at a physical address
    #[inline]
    pub fn read_dram(&self, address: u32) -> u32 {
        read_be_word(&self.dram, (address & !3) as usize).unwrap_or(0)
    }

    /// Write the bits of `value` selected by `mask` to main memory
    #[inline]
    pub fn write_dram(&mut self, address: u32, value: u32, mask: u32) {
        write_be_word(&mut self.dram, (address & !3) as usize, value, mask);
    }

    /// Byte view of main memory
    pub fn dram(&self) -> &[u8] {
        &self.dram
    }

    /// Mutable byte view of main memory
    pub fn dram_mut(&mut self) -> &mut [u8] {
        &mut self.dram
    }

    /// Copy `src` into memory at `address`, clipped to the populated size
    ///
    /// # Returns
    ///
    /// Number of bytes copied
    pub fn copy_in(&mut self, address: usize, src: &[u8]) -> usize {
        let Some(dst) = self.dram.get_mut(address..) else {
            return 0;
        };
        let len = src.len().min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        len
    }

    /// Copy memory at `address` into `dst`, clipped to the populated size
    ///
    /// Bytes past the end of memory are left untouched.
    ///
    /// # Returns
    ///
    /// Number of bytes copied
    pub fn copy_out(&self, address: usize, dst: &mut [u8]) -> usize {
        let Some(src) = self.dram.get(address..) else {
            return 0;
        };
        let len = dst.len().min(src.len());
        dst[..len].copy_from_slice(&src[..len]);
        len
    }
}
