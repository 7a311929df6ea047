// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Helper functions for memory tests

use super::*;

/// 4 MiB RDRAM
pub const DRAM_4M: usize = 0x40_0000;

/// 8 MiB cartridge
pub const ROM_8M: usize = 0x80_0000;

/// Mapping configuration without a disk drive
pub fn cart_only() -> MappingConfig {
    MappingConfig {
        dram_size: DRAM_4M,
        rom_size: ROM_8M,
        dd_rom_size: 0,
    }
}

/// Mapping configuration with a 4 MiB disk drive ROM
pub fn with_disk_drive() -> MappingConfig {
    MappingConfig {
        dd_rom_size: 0x40_0000,
        ..cart_only()
    }
}

/// Creates a bus for a cartridge-only machine
pub fn create_test_bus() -> Bus {
    Bus::new(build_mappings(&cart_only()))
}

/// Region handlers recording every access they receive
///
/// Reads return the low byte of the region kind's discriminant in the top
/// byte and the low 24 address bits below it, so tests can tell both the
/// target and the address that reached it.
#[derive(Default)]
pub struct RecordingHandlers {
    pub reads: Vec<(RegionKind, u32)>,
    pub writes: Vec<(RegionKind, u32, u32, u32)>,
}

impl RegionHandlers for RecordingHandlers {
    fn read(&mut self, kind: RegionKind, address: u32) -> u32 {
        self.reads.push((kind, address));
        ((kind as u32) << 24) | (address & 0x00FF_FFFF)
    }

    fn write(&mut self, kind: RegionKind, address: u32, value: u32, mask: u32) {
        self.writes.push((kind, address, value, mask));
    }
}
