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

//! Serial Interface (SI)
//!
//! Moves the 64-byte PIF RAM block to and from RDRAM. Writing one of the
//! PIF address registers starts a transfer; the SI interrupt fires once
//! the configured transfer duration has elapsed.

use super::mi::{MiController, MiIntr};
use crate::core::memory::layout::SI_REGS_COUNT;
use crate::core::memory::{MemoryHandler, RegisterFile};
use crate::core::r4300::Cp0;

pub const SI_DRAM_ADDR_REG: usize = 0;
pub const SI_PIF_ADDR_RD64B_REG: usize = 1;
pub const SI_PIF_ADDR_WR64B_REG: usize = 4;
pub const SI_STATUS_REG: usize = 6;

pub const SI_STATUS_DMA_BUSY: u32 = 0x0001;
pub const SI_STATUS_IO_BUSY: u32 = 0x0002;
pub const SI_STATUS_DMA_ERROR: u32 = 0x0008;
pub const SI_STATUS_INTERRUPT: u32 = 0x1000;

/// Direction of an SI transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiDmaDirection {
    /// PIF RAM to RDRAM (SI_PIF_ADDR_RD64B)
    PifToDram,
    /// RDRAM to PIF RAM (SI_PIF_ADDR_WR64B)
    DramToPif,
}

/// Transfer latched by a PIF address register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiDmaRequest {
    pub direction: SiDmaDirection,
    pub dram_address: u32,
}

/// Serial interface
pub struct SiController {
    pub regs: RegisterFile<SI_REGS_COUNT>,

    /// Cycles one transfer takes
    dma_duration: u64,
}

impl SiController {
    pub fn new(dma_duration: u64) -> Self {
        Self {
            regs: RegisterFile::new(),
            dma_duration,
        }
    }

    pub fn poweron(&mut self) {
        self.regs.reset();
    }

    pub fn dma_duration(&self) -> u64 {
        self.dma_duration
    }

    pub fn read(&mut self, address: u32) -> u32 {
        self.regs.read_word(address)
    }

    /// Write an SI register
    ///
    /// # Returns
    ///
    /// The transfer to perform when a PIF address register was written
    pub fn write(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        mi: &mut MiController,
        cp0: &mut Cp0,
    ) -> Option<SiDmaRequest> {
        let direction = match RegisterFile::<SI_REGS_COUNT>::index(address) {
            SI_PIF_ADDR_RD64B_REG => SiDmaDirection::PifToDram,
            SI_PIF_ADDR_WR64B_REG => SiDmaDirection::DramToPif,
            SI_STATUS_REG => {
                *self.regs.get_mut(SI_STATUS_REG) &= !SI_STATUS_INTERRUPT;
                mi.clear(MiIntr::SI, cp0);
                return None;
            }
            _ => {
                self.regs.write_word(address, value, mask);
                return None;
            }
        };

        *self.regs.get_mut(SI_STATUS_REG) |= SI_STATUS_DMA_BUSY;
        Some(SiDmaRequest {
            direction,
            dram_address: self.regs.get(SI_DRAM_ADDR_REG) & 0xFF_FFFF,
        })
    }

    /// End of transfer: clear busy and raise SI
    pub fn end_of_dma(&mut self, mi: &mut MiController, cp0: &mut Cp0) {
        let status = self.regs.get_mut(SI_STATUS_REG);
        *status &= !(SI_STATUS_DMA_BUSY | SI_STATUS_IO_BUSY);
        *status |= SI_STATUS_INTERRUPT;
        mi.raise(MiIntr::SI, cp0);
    }
}
