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

//! Address-space layer of the Nintendo 64 machine
//!
//! The Bus is the central component for all memory operations. It owns the
//! mapping table built at composition time and routes every physical access
//! to the region that claims it, falling back to open-bus behavior when no
//! region does.
//!
//! # Physical Memory Map
//!
//! | Physical Address Range  | Region              | Notes                          |
//! |-------------------------|---------------------|--------------------------------|
//! | 0x00000000-0x03EFFFFF   | RDRAM               | 4 or 8 MiB populated           |
//! | 0x03F00000-0x03FFFFFF   | RDRAM registers     |                                |
//! | 0x04000000-0x0400FFFF   | SP DMEM/IMEM        | 8 KiB                          |
//! | 0x04040000-0x0404FFFF   | SP registers        |                                |
//! | 0x04080000-0x0408FFFF   | SP PC / IBIST       |                                |
//! | 0x04100000-0x0410FFFF   | DP command regs     |                                |
//! | 0x04200000-0x0420FFFF   | DP span regs        |                                |
//! | 0x04300000-0x048FFFFF   | MI, VI, AI, PI, RI, SI | one 64 KiB window each      |
//! | 0x05000000-0x05FFFFFF   | DOM2 addr1          | disk drive registers or unused |
//! | 0x06000000-0x07FFFFFF   | DOM1 addr1          | disk drive ROM or unused       |
//! | 0x08000000-0x0801FFFF   | DOM2 addr2          | SRAM / FlashRAM                |
//! | 0x10000000-0x1FBFFFFF   | DOM1 addr2          | cartridge ROM                  |
//! | 0x13FF0000-0x13FF0FFF   | debug viewer        |                                |
//! | 0x1FC00000-0x1FC007FF   | PIF ROM + RAM       |                                |
//!
//! # Address Translation
//!
//! The CPU sees physical memory through two unmapped segments:
//! - KSEG0 (0x80000000-0x9FFFFFFF): cached
//! - KSEG1 (0xA0000000-0xBFFFFFFF): uncached
//!
//! The Bus itself only ever sees physical addresses; see [`translate_address`].
//!
//! # Example
//!
//! ```
//! use n64rx::core::memory::{build_mappings, Bus, MappingConfig, RegionKind};
//!
//! let mappings = build_mappings(&MappingConfig {
//!     dram_size: 0x80_0000,
//!     rom_size: 0x100_0000,
//!     dd_rom_size: 0,
//! });
//! let bus = Bus::new(mappings);
//!
//! assert_eq!(bus.kind_at(0x0000_1000), RegionKind::Rdram);
//! assert_eq!(bus.kind_at(0x1000_0040), RegionKind::CartRom);
//! assert_eq!(bus.kind_at(0x0500_0000), RegionKind::Nothing);
//! ```

mod bus;
mod dma;
mod handler;
mod host;
mod map;
mod region;

#[cfg(test)]
mod tests;

pub use bus::{Bus, RegionHandlers};
pub use dma::{resolve_pi_dma_handler, PiDmaHandler};
pub use handler::{MemoryHandler, RegisterFile};
pub use host::{
    build_host_map, HostEnvironment, HostMemoryDescriptor, HostMemoryMap, HOST_MAP_CAPACITY,
};
pub use map::{
    build_mappings, MappingConfig, MappingTable, DD_REGS_SLOT, DD_ROM_SLOT, MAPPING_COUNT,
};
pub use region::{Backing, HostRegion, MemDescFlags, MemoryMapping, RegionKind};

/// Fixed physical addresses and sizes of the memory map
pub mod layout {
    /// RDRAM (main memory)
    pub const RDRAM_DRAM: u32 = 0x0000_0000;
    /// RDRAM configuration registers
    pub const RDRAM_REGS: u32 = 0x03F0_0000;
    /// SP data + instruction memory
    pub const SP_MEM: u32 = 0x0400_0000;
    /// SP registers
    pub const SP_REGS: u32 = 0x0404_0000;
    /// SP program counter / IBIST
    pub const SP_REGS2: u32 = 0x0408_0000;
    /// DP command registers
    pub const DPC_REGS: u32 = 0x0410_0000;
    /// DP span registers
    pub const DPS_REGS: u32 = 0x0420_0000;
    /// MIPS interface
    pub const MI_REGS: u32 = 0x0430_0000;
    /// Video interface
    pub const VI_REGS: u32 = 0x0440_0000;
    /// Audio interface
    pub const AI_REGS: u32 = 0x0450_0000;
    /// Peripheral (parallel) interface
    pub const PI_REGS: u32 = 0x0460_0000;
    /// RDRAM interface
    pub const RI_REGS: u32 = 0x0470_0000;
    /// Serial interface
    pub const SI_REGS: u32 = 0x0480_0000;
    /// DOM2 addr1: disk drive registers and buffers
    pub const DOM2_ADDR1: u32 = 0x0500_0000;
    /// DOM1 addr1: disk drive IPL ROM
    pub const DD_ROM: u32 = 0x0600_0000;
    /// DOM2 addr2: cartridge save media
    pub const DOM2_ADDR2: u32 = 0x0800_0000;
    /// DOM1 addr2: cartridge ROM
    pub const CART_ROM: u32 = 0x1000_0000;
    /// Debug viewer window
    pub const IS_VIEWER: u32 = 0x13FF_0000;
    /// PIF boot ROM and scratch RAM
    pub const PIF_MEM: u32 = 0x1FC0_0000;
    /// DOM3 window above the cartridge ROM band
    pub const CART_DOM3: u32 = 0x1FD0_0000;

    /// Cached unmapped segment
    pub const KSEG0: u32 = 0x8000_0000;
    /// Uncached unmapped segment
    pub const KSEG1: u32 = 0xA000_0000;

    /// PIF boot ROM size
    pub const PIF_ROM_SIZE: usize = 0x7C0;
    /// PIF scratch RAM size
    pub const PIF_RAM_SIZE: usize = 0x40;
    /// SP DMEM + IMEM size
    pub const SP_MEM_SIZE: usize = 0x2000;
    /// Battery-backed SRAM size
    pub const SRAM_SIZE: usize = 0x8000;
    /// FlashRAM size
    pub const FLASHRAM_SIZE: usize = 0x2_0000;
    /// Debug viewer buffer size
    pub const IS_VIEWER_SIZE: usize = 0x1000;

    /// Largest cartridge ROM the DOM1 addr2 band can hold
    pub const MAX_ROM_SIZE: usize = (CART_DOM3 - CART_ROM) as usize;
    /// Largest disk drive ROM the DOM1 addr1 band can hold
    pub const MAX_DD_ROM_SIZE: usize = (DOM2_ADDR2 - DD_ROM) as usize;

    pub const RDRAM_REGS_COUNT: usize = 10;
    pub const SP_REGS_COUNT: usize = 8;
    pub const SP_REGS2_COUNT: usize = 2;
    pub const DPC_REGS_COUNT: usize = 8;
    pub const DPS_REGS_COUNT: usize = 4;
    pub const MI_REGS_COUNT: usize = 4;
    pub const VI_REGS_COUNT: usize = 14;
    pub const AI_REGS_COUNT: usize = 6;
    pub const PI_REGS_COUNT: usize = 13;
    pub const RI_REGS_COUNT: usize = 8;
    pub const SI_REGS_COUNT: usize = 7;
    pub const DD_ASIC_REGS_COUNT: usize = 20;
}

/// Value returned by reads that no device answers
///
/// The low half of the address floats on the bus and is seen in both halves
/// of the word.
///
/// # Example
///
/// ```
/// use n64rx::core::memory::open_bus;
///
/// assert_eq!(open_bus(0x0500_1234), 0x1234_1234);
/// ```
#[inline(always)]
pub fn open_bus(address: u32) -> u32 {
    let low = address & 0xFFFF;
    low | (low << 16)
}

/// Merge `value` into `dst` for the bits selected by `mask`
#[inline(always)]
pub fn masked_write(dst: &mut u32, value: u32, mask: u32) {
    *dst = (*dst & !mask) | (value & mask);
}

/// Translate a CPU virtual address in KSEG0/KSEG1 to a physical address
///
/// Addresses outside the two unmapped kernel segments are passed through
/// unchanged; TLB translation belongs to the execution core.
///
/// # Example
///
/// ```
/// use n64rx::core::memory::translate_address;
///
/// assert_eq!(translate_address(0x8000_1234), 0x0000_1234);
/// assert_eq!(translate_address(0xA400_0040), 0x0400_0040);
/// assert_eq!(translate_address(0x0000_1234), 0x0000_1234);
/// ```
#[inline(always)]
pub fn translate_address(vaddr: u32) -> u32 {
    match vaddr & 0xE000_0000 {
        layout::KSEG0 | layout::KSEG1 => vaddr & 0x1FFF_FFFF,
        _ => vaddr,
    }
}

/// Read a big-endian word from a byte buffer, `None` when out of range
#[inline]
pub(crate) fn read_be_word(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Masked big-endian word store into a byte buffer; out of range stores are dropped
#[inline]
pub(crate) fn write_be_word(buf: &mut [u8], offset: usize, value: u32, mask: u32) {
    let Some(end) = offset.checked_add(4) else {
        return;
    };
    if let Some(bytes) = buf.get_mut(offset..end) {
        let mut word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        masked_write(&mut word, value, mask);
        bytes.copy_from_slice(&word.to_be_bytes());
    }
}
