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

//! Mapping table builder
//!
//! Assembles the ordered region table for one machine configuration. The
//! table has a fixed number of slots: slot 0 is the open-bus catch-all and
//! every later slot overrides earlier ones where they overlap. The two disk
//! drive slots always exist; without a disk drive they hold open-bus
//! placeholders over the same windows.

use super::layout::*;
use super::region::{Backing, HostRegion, MemDescFlags, MemoryMapping, RegionKind};

/// Number of slots in the mapping table
pub const MAPPING_COUNT: usize = 20;

/// Slot holding the disk drive registers (DOM2 addr1) or its placeholder
pub const DD_REGS_SLOT: usize = 14;

/// Slot holding the disk drive ROM (DOM1 addr1) or its placeholder
pub const DD_ROM_SLOT: usize = 15;

/// The complete, fixed-size mapping table
pub type MappingTable = [MemoryMapping; MAPPING_COUNT];

/// Sizes the mapping table depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingConfig {
    /// Populated RDRAM in bytes
    pub dram_size: usize,
    /// Cartridge ROM image size in bytes (0 = no cartridge)
    pub rom_size: usize,
    /// Disk drive ROM image size in bytes (0 = no disk drive)
    pub dd_rom_size: usize,
}

/// Register window of `count` 32-bit registers exported from `backing`
const fn regs(
    begin: u32,
    mask: u32,
    kind: RegionKind,
    backing: Backing,
    count: usize,
) -> MemoryMapping {
    MemoryMapping::new(
        begin,
        mask,
        kind,
        HostRegion::new(backing, count * 4, MemDescFlags::empty()),
    )
}

/// Build the mapping table for a machine configuration
///
/// # Panics
///
/// Panics if a size does not fit the window reserved for it. Sizes are
/// validated by [`MachineConfig::validate`](crate::core::config::MachineConfig::validate)
/// before composition; reaching the assertion is a programming error.
///
/// # Example
///
/// ```
/// use n64rx::core::memory::{build_mappings, MappingConfig, RegionKind, DD_REGS_SLOT};
///
/// let table = build_mappings(&MappingConfig {
///     dram_size: 0x40_0000,
///     rom_size: 0x80_0000,
///     dd_rom_size: 0x40_0000,
/// });
/// assert_eq!(table[DD_REGS_SLOT].kind, RegionKind::DdRegs);
/// ```
pub fn build_mappings(config: &MappingConfig) -> MappingTable {
    assert!(
        config.dram_size > 0 && config.dram_size <= (RDRAM_REGS - RDRAM_DRAM) as usize,
        "RDRAM size 0x{:X} does not fit the RDRAM window",
        config.dram_size
    );
    assert!(
        config.rom_size <= MAX_ROM_SIZE,
        "cartridge ROM size 0x{:X} does not fit the DOM1 addr2 window",
        config.rom_size
    );
    assert!(
        config.dd_rom_size <= MAX_DD_ROM_SIZE,
        "disk drive ROM size 0x{:X} does not fit the DOM1 addr1 window",
        config.dd_rom_size
    );

    let mut table: MappingTable = [
        // catch-all, lowest priority
        MemoryMapping::new(0x0000_0000, 0xFFFF_FFFF, RegionKind::Nothing, HostRegion::NONE),
        MemoryMapping::new(
            RDRAM_DRAM,
            0x03EF_FFFF,
            RegionKind::Rdram,
            HostRegion::new(Backing::Rdram, config.dram_size, MemDescFlags::SYSTEM_RAM),
        ),
        regs(RDRAM_REGS, 0xF_FFFF, RegionKind::RdramRegs, Backing::RdramRegs, RDRAM_REGS_COUNT),
        MemoryMapping::new(
            SP_MEM,
            0xFFFF,
            RegionKind::SpMem,
            HostRegion::new(Backing::SpMem, SP_MEM_SIZE, MemDescFlags::empty()),
        ),
        regs(SP_REGS, 0xFFFF, RegionKind::SpRegs, Backing::SpRegs, SP_REGS_COUNT),
        regs(SP_REGS2, 0xFFFF, RegionKind::SpRegs2, Backing::SpRegs2, SP_REGS2_COUNT),
        regs(DPC_REGS, 0xFFFF, RegionKind::DpRegs, Backing::DpcRegs, DPC_REGS_COUNT),
        regs(DPS_REGS, 0xFFFF, RegionKind::DpsRegs, Backing::DpsRegs, DPS_REGS_COUNT),
        regs(MI_REGS, 0xFFFF, RegionKind::Mi, Backing::MiRegs, MI_REGS_COUNT),
        regs(VI_REGS, 0xFFFF, RegionKind::Vi, Backing::ViRegs, VI_REGS_COUNT),
        regs(AI_REGS, 0xFFFF, RegionKind::Ai, Backing::AiRegs, AI_REGS_COUNT),
        regs(PI_REGS, 0xFFFF, RegionKind::Pi, Backing::PiRegs, PI_REGS_COUNT),
        regs(RI_REGS, 0xFFFF, RegionKind::Ri, Backing::RiRegs, RI_REGS_COUNT),
        regs(SI_REGS, 0xFFFF, RegionKind::Si, Backing::SiRegs, SI_REGS_COUNT),
        // DD slots: reserved windows unless a disk drive is present
        MemoryMapping::new(DOM2_ADDR1, 0xFF_FFFF, RegionKind::Nothing, HostRegion::NONE),
        MemoryMapping::new(DD_ROM, 0x1FF_FFFF, RegionKind::Nothing, HostRegion::NONE),
        // save media backing is chosen by the host map exporter
        MemoryMapping::new(DOM2_ADDR2, 0x1_FFFF, RegionKind::FlashramStatus, HostRegion::NONE),
        MemoryMapping::new(IS_VIEWER, 0xFFF, RegionKind::DebugViewer, HostRegion::NONE),
        cart_rom_mapping(config.rom_size),
        // split into ROM and RAM by the host map exporter
        MemoryMapping::new(PIF_MEM, 0xFFFF, RegionKind::Pif, HostRegion::NONE),
    ];

    if config.dd_rom_size > 0 {
        table[DD_REGS_SLOT] = regs(
            DOM2_ADDR1,
            0xFF_FFFF,
            RegionKind::DdRegs,
            Backing::DdRegs,
            DD_ASIC_REGS_COUNT,
        );
        table[DD_ROM_SLOT] = MemoryMapping::new(
            DD_ROM,
            (config.dd_rom_size - 1) as u32,
            RegionKind::DdRom,
            HostRegion::new(Backing::DdRom, config.dd_rom_size, MemDescFlags::CONST),
        );
    }

    log::debug!(
        "Mapping table built: RDRAM 0x{:X}, ROM 0x{:X}, DD ROM 0x{:X}",
        config.dram_size,
        config.rom_size,
        config.dd_rom_size
    );

    table
}

fn cart_rom_mapping(rom_size: usize) -> MemoryMapping {
    if rom_size == 0 {
        // no cartridge: leave the band to open bus
        return MemoryMapping::new(CART_ROM, 0, RegionKind::Nothing, HostRegion::NONE);
    }
    MemoryMapping::new(
        CART_ROM,
        (rom_size - 1) as u32,
        RegionKind::CartRom,
        HostRegion::new(Backing::CartRom, rom_size, MemDescFlags::CONST),
    )
}
