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

//! Peripheral Interface (PI)
//!
//! DMA engine between RDRAM and the cartridge bus. Writing a length register
//! starts a transfer; the controller only latches it and hands back a
//! [`PiDmaRequest`]. Which device serves the cartridge side is decided per
//! transfer by [`resolve_pi_dma_handler`](crate::core::memory::resolve_pi_dma_handler).
//!
//! ## Transfer Directions
//!
//! ```text
//! PI_RD_LEN:  RDRAM ──▶ cartridge
//! PI_WR_LEN:  cartridge ──▶ RDRAM
//! ```

use super::mi::{MiController, MiIntr};
use crate::core::memory::layout::PI_REGS_COUNT;
use crate::core::memory::{MemoryHandler, RegisterFile};
use crate::core::r4300::Cp0;

pub const PI_DRAM_ADDR_REG: usize = 0;
pub const PI_CART_ADDR_REG: usize = 1;
pub const PI_RD_LEN_REG: usize = 2;
pub const PI_WR_LEN_REG: usize = 3;
pub const PI_STATUS_REG: usize = 4;
pub const PI_BSD_DOM1_LAT_REG: usize = 5;
pub const PI_BSD_DOM1_PWD_REG: usize = 6;
pub const PI_BSD_DOM1_PGS_REG: usize = 7;
pub const PI_BSD_DOM1_RLS_REG: usize = 8;
pub const PI_BSD_DOM2_LAT_REG: usize = 9;
pub const PI_BSD_DOM2_PWD_REG: usize = 10;
pub const PI_BSD_DOM2_PGS_REG: usize = 11;
pub const PI_BSD_DOM2_RLS_REG: usize = 12;

pub const PI_STATUS_DMA_BUSY: u32 = 0x01;
pub const PI_STATUS_IO_BUSY: u32 = 0x02;
pub const PI_STATUS_ERROR: u32 = 0x04;
pub const PI_STATUS_INTERRUPT: u32 = 0x08;

const PI_STATUS_RESET: u32 = 0x01;
const PI_STATUS_CLR_INTR: u32 = 0x02;

/// Direction of a PI transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiDmaDirection {
    /// RDRAM to the cartridge bus (PI_RD_LEN)
    ToCart,
    /// Cartridge bus to RDRAM (PI_WR_LEN)
    FromCart,
}

/// Transfer latched by a length register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiDmaRequest {
    pub direction: PiDmaDirection,
    /// Cartridge-side physical address
    pub cart_address: u32,
    /// RDRAM address
    pub dram_address: u32,
    /// Length in bytes
    pub length: u32,
}

/// Peripheral interface
pub struct PiController {
    pub regs: RegisterFile<PI_REGS_COUNT>,
}

impl PiController {
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
        }
    }

    pub fn poweron(&mut self) {
        self.regs.reset();
    }

    /// Whether a transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.regs.get(PI_STATUS_REG) & PI_STATUS_DMA_BUSY != 0
    }

    /// Read a PI register
    pub fn read(&mut self, address: u32) -> u32 {
        self.regs.read_word(address)
    }

    /// Write a PI register
    ///
    /// # Returns
    ///
    /// The transfer to perform when a length register was written
    pub fn write(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        mi: &mut MiController,
        cp0: &mut Cp0,
    ) -> Option<PiDmaRequest> {
        match RegisterFile::<PI_REGS_COUNT>::index(address) {
            reg @ (PI_RD_LEN_REG | PI_WR_LEN_REG) => {
                self.regs.write_word(address, value, mask);
                let direction = if reg == PI_RD_LEN_REG {
                    PiDmaDirection::ToCart
                } else {
                    PiDmaDirection::FromCart
                };
                *self.regs.get_mut(PI_STATUS_REG) |= PI_STATUS_DMA_BUSY;

                Some(PiDmaRequest {
                    direction,
                    cart_address: self.regs.get(PI_CART_ADDR_REG) & !1,
                    dram_address: self.regs.get(PI_DRAM_ADDR_REG) & 0xFF_FFFE,
                    length: (self.regs.get(reg) & 0xFF_FFFF) + 1,
                })
            }
            PI_STATUS_REG => {
                let command = value & mask;
                if command & PI_STATUS_RESET != 0 {
                    *self.regs.get_mut(PI_STATUS_REG) &=
                        !(PI_STATUS_DMA_BUSY | PI_STATUS_IO_BUSY | PI_STATUS_ERROR);
                }
                if command & PI_STATUS_CLR_INTR != 0 {
                    *self.regs.get_mut(PI_STATUS_REG) &= !PI_STATUS_INTERRUPT;
                    mi.clear(MiIntr::PI, cp0);
                }
                None
            }
            _ => {
                self.regs.write_word(address, value, mask);
                None
            }
        }
    }

    /// Cycles a transfer of `length` bytes keeps the PI busy
    pub fn dma_duration(length: u32) -> u64 {
        (length as u64).div_ceil(8).max(1)
    }

    /// End of transfer: clear busy and raise PI
    pub fn end_of_dma(&mut self, mi: &mut MiController, cp0: &mut Cp0) {
        let status = self.regs.get_mut(PI_STATUS_REG);
        *status &= !PI_STATUS_DMA_BUSY;
        *status |= PI_STATUS_INTERRUPT;
        mi.raise(MiIntr::PI, cp0);
    }
}

impl Default for PiController {
    fn default() -> Self {
        Self::new()
    }
}
