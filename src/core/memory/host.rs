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

//! Host memory map export
//!
//! Converts the mapping table into the flat descriptor list an external
//! inspection interface (debugger, cheat engine, achievement runtime)
//! consumes. The host view differs from the bus view in three places:
//!
//! - RDRAM is exported twice, through KSEG0 (cached) and KSEG1 (uncached),
//!   over the same backing store
//! - the save media window points at SRAM or FlashRAM, chosen once from the
//!   declared save type
//! - the PIF window is split into a constant boot ROM part and a writable
//!   scratch RAM part
//!
//! Every other exported region appears once at its KSEG1 address.

use arrayvec::ArrayVec;
use serde::Serialize;

use super::layout::{FLASHRAM_SIZE, KSEG0, KSEG1, PIF_RAM_SIZE, PIF_ROM_SIZE, SRAM_SIZE};
use super::map::MAPPING_COUNT;
use super::region::{Backing, MemDescFlags, MemoryMapping, RegionKind};
use crate::core::config::SaveType;

/// Capacity of the host memory map: one slot per mapping plus the second
/// RDRAM alias and the second PIF half
pub const HOST_MAP_CAPACITY: usize = MAPPING_COUNT + 2;

/// Fixed-capacity host memory map
pub type HostMemoryMap = ArrayVec<HostMemoryDescriptor, HOST_MAP_CAPACITY>;

/// One entry of the exported memory map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostMemoryDescriptor {
    /// Buffer the entry is a view of
    pub backing: Backing,
    /// Virtual start address seen by the host
    pub start: u32,
    /// Length in bytes
    pub len: usize,
    /// Descriptor flags
    pub flags: MemDescFlags,
    /// Address bits that must match for the entry to apply (0 = derive from start/len)
    pub select: u32,
    /// Address bits removed before indexing into the backing buffer
    pub disconnect: u32,
}

impl HostMemoryDescriptor {
    fn new(backing: Backing, start: u32, len: usize, flags: MemDescFlags) -> Self {
        Self {
            backing,
            start,
            len,
            flags,
            select: 0,
            disconnect: 0,
        }
    }
}

/// Environment capability receiving the exported memory map
///
/// The export is a one-way notification: whether the host accepted it is
/// not reported back to the machine.
pub trait HostEnvironment {
    /// Publish the machine's memory map, returning whether the host used it
    fn set_memory_maps(&mut self, descriptors: &[HostMemoryDescriptor]) -> bool;
}

/// Build the host memory map from the mapping table
///
/// # Arguments
///
/// * `mappings` - The mapping table the bus was built from
/// * `save_type` - Declared save type; selects the save media backing
///
/// # Example
///
/// ```
/// use n64rx::core::config::SaveType;
/// use n64rx::core::memory::{build_host_map, build_mappings, Backing, MappingConfig};
///
/// let table = build_mappings(&MappingConfig {
///     dram_size: 0x40_0000,
///     rom_size: 0x40_0000,
///     dd_rom_size: 0,
/// });
/// let map = build_host_map(&table, SaveType::Sram);
///
/// assert_eq!(map.iter().filter(|d| d.backing == Backing::Rdram).count(), 2);
/// assert!(map.iter().any(|d| d.backing == Backing::Sram));
/// ```
pub fn build_host_map(mappings: &[MemoryMapping], save_type: SaveType) -> HostMemoryMap {
    let mut descriptors = HostMemoryMap::new();

    for mapping in mappings {
        match mapping.kind {
            RegionKind::Rdram => {
                let mut cached = HostMemoryDescriptor::new(
                    Backing::Rdram,
                    KSEG0 | mapping.begin,
                    mapping.host.len,
                    mapping.host.flags,
                );
                cached.select = 0x2000_0000;
                cached.disconnect = 0xC000_0000;
                descriptors.push(cached);

                descriptors.push(HostMemoryDescriptor::new(
                    Backing::Rdram,
                    KSEG1 | mapping.begin,
                    mapping.host.len,
                    mapping.host.flags,
                ));
            }
            RegionKind::FlashramStatus => {
                let (backing, len) = match save_type {
                    SaveType::Sram => (Backing::Sram, SRAM_SIZE),
                    SaveType::Auto | SaveType::FlashRam => (Backing::FlashRam, FLASHRAM_SIZE),
                };
                descriptors.push(HostMemoryDescriptor::new(
                    backing,
                    KSEG1 | mapping.begin,
                    len,
                    mapping.host.flags,
                ));
            }
            RegionKind::Pif => {
                descriptors.push(HostMemoryDescriptor::new(
                    Backing::PifRom,
                    KSEG1 | mapping.begin,
                    PIF_ROM_SIZE,
                    MemDescFlags::CONST,
                ));
                descriptors.push(HostMemoryDescriptor::new(
                    Backing::PifRam,
                    KSEG1 | (mapping.begin + PIF_ROM_SIZE as u32),
                    PIF_RAM_SIZE,
                    MemDescFlags::empty(),
                ));
            }
            _ => {
                if let Some(backing) = mapping.host.backing {
                    descriptors.push(HostMemoryDescriptor::new(
                        backing,
                        KSEG1 | mapping.begin,
                        mapping.host.len,
                        mapping.host.flags,
                    ));
                }
            }
        }
    }

    log::debug!("Host memory map: {} descriptors", descriptors.len());
    descriptors
}
