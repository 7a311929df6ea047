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

//! Peripheral interface DMA handler resolution
//!
//! Bulk transfers issued by the PI do not go through the mapping table: the
//! cartridge-side address is resolved per transfer against four address
//! bands, because the same band can be served by the cartridge or by the disk
//! drive depending on what is installed.
//!
//! ```text
//! 0x1FD00000 ─┬─ DOM3          cartridge
//! 0x10000000 ─┼─ DOM1 addr2    cartridge ROM
//! 0x08000000 ─┼─ DOM2 addr2    cartridge save media
//! 0x05000000 ─┼─ DOM2 addr1 /  disk drive buffers and ROM
//!             │  DOM1 addr1    (only when a disk drive is present)
//!             └─ below: no handler
//! ```

use super::layout::{CART_DOM3, CART_ROM, DOM2_ADDR1, DOM2_ADDR2};

/// Handler selected for one PI DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiDmaHandler {
    /// Cartridge DOM3 window
    CartDom3,
    /// Cartridge ROM
    CartRom,
    /// Cartridge save media (SRAM / FlashRAM)
    CartDom2,
    /// Disk drive buffers and IPL ROM
    DiskDrive,
}

/// Resolve the DMA handler for a cartridge-side address
///
/// Bands are checked from the highest address downward. The disk drive band
/// only exists when a disk drive is composed; without one, and below it,
/// there is no handler.
///
/// # Arguments
///
/// * `address` - Cartridge-side (PI_CART_ADDR) address of the transfer
/// * `disk_drive_present` - Whether the machine has a disk drive
///
/// # Example
///
/// ```
/// use n64rx::core::memory::{resolve_pi_dma_handler, PiDmaHandler};
///
/// assert_eq!(resolve_pi_dma_handler(0x1000_1000, false), Some(PiDmaHandler::CartRom));
/// assert_eq!(resolve_pi_dma_handler(0x1FD0_0000, false), Some(PiDmaHandler::CartDom3));
/// assert_eq!(resolve_pi_dma_handler(0x0500_0000, true), Some(PiDmaHandler::DiskDrive));
/// assert_eq!(resolve_pi_dma_handler(0x0500_0000, false), None);
/// ```
pub fn resolve_pi_dma_handler(address: u32, disk_drive_present: bool) -> Option<PiDmaHandler> {
    if address >= CART_DOM3 {
        Some(PiDmaHandler::CartDom3)
    } else if address >= CART_ROM {
        Some(PiDmaHandler::CartRom)
    } else if address >= DOM2_ADDR2 {
        Some(PiDmaHandler::CartDom2)
    } else if address >= DOM2_ADDR1 && disk_drive_present {
        Some(PiDmaHandler::DiskDrive)
    } else {
        None
    }
}
