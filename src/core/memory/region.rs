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

//! Memory region descriptors
//!
//! One [`MemoryMapping`] describes one entry of the mapping table: the
//! physical window it claims, which device answers it, and how the window
//! is presented to an external inspection interface.

use bitflags::bitflags;
use serde::Serialize;

/// Memory region identification
///
/// Used both as the type tag of a mapping entry and as the dispatch key the
/// bus hands to the device aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegionKind {
    /// Nothing answers; open-bus behavior
    Nothing,
    /// Main memory
    Rdram,
    /// RDRAM configuration registers
    RdramRegs,
    /// SP DMEM/IMEM
    SpMem,
    /// SP registers
    SpRegs,
    /// SP PC / IBIST registers
    SpRegs2,
    /// DP command registers
    DpRegs,
    /// DP span registers
    DpsRegs,
    /// MIPS interface
    Mi,
    /// Video interface
    Vi,
    /// Audio interface
    Ai,
    /// Peripheral interface
    Pi,
    /// RDRAM interface
    Ri,
    /// Serial interface
    Si,
    /// Cartridge save media (SRAM or FlashRAM status/command)
    FlashramStatus,
    /// Cartridge ROM
    CartRom,
    /// Disk drive registers and buffers
    DdRegs,
    /// Disk drive IPL ROM
    DdRom,
    /// PIF boot ROM and scratch RAM
    Pif,
    /// Debug viewer text channel
    DebugViewer,
}

/// Backing store a host export descriptor points into
///
/// Stands in for the raw pointer of a host memory descriptor: the device
/// aggregate resolves it to a bounds-checked byte view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backing {
    Rdram,
    RdramRegs,
    SpMem,
    SpRegs,
    SpRegs2,
    DpcRegs,
    DpsRegs,
    MiRegs,
    ViRegs,
    AiRegs,
    PiRegs,
    RiRegs,
    SiRegs,
    Sram,
    FlashRam,
    CartRom,
    DdRegs,
    DdRom,
    PifRom,
    PifRam,
}

bitflags! {
    /// Host memory descriptor flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct MemDescFlags: u64 {
        /// Contents never change (ROM)
        const CONST = 1 << 0;
        /// Big-endian storage
        const BIGENDIAN = 1 << 1;
        /// Main system RAM
        const SYSTEM_RAM = 1 << 2;
        /// Save RAM
        const SAVE_RAM = 1 << 3;
        /// Video RAM
        const VIDEO_RAM = 1 << 4;
    }
}

/// How a mapping entry is presented to the host inspection interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRegion {
    /// Buffer backing the region, `None` when nothing is exported
    pub backing: Option<Backing>,
    /// Exported length in bytes
    pub len: usize,
    /// Descriptor flags
    pub flags: MemDescFlags,
}

impl HostRegion {
    /// Region that is not exported
    pub const NONE: Self = Self {
        backing: None,
        len: 0,
        flags: MemDescFlags::empty(),
    };

    /// Region exported from `backing`
    pub const fn new(backing: Backing, len: usize, flags: MemDescFlags) -> Self {
        Self {
            backing: Some(backing),
            len,
            flags,
        }
    }
}

/// One entry of the mapping table
///
/// Claims the physical window `[begin, begin | mask]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMapping {
    /// First physical address of the window
    pub begin: u32,
    /// Address mask; the window ends at `begin | mask`
    pub mask: u32,
    /// Device answering the window
    pub kind: RegionKind,
    /// Host export description
    pub host: HostRegion,
}

impl MemoryMapping {
    /// Build a mapping for `kind` over `[begin, begin | mask]`
    pub const fn new(begin: u32, mask: u32, kind: RegionKind, host: HostRegion) -> Self {
        Self {
            begin,
            mask,
            kind,
            host,
        }
    }

    /// Last physical address claimed by this mapping
    #[inline]
    pub const fn end(&self) -> u32 {
        self.begin | self.mask
    }

    /// Check if this mapping claims the given physical address
    #[inline]
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.begin && address <= self.end()
    }

    /// Check whether two mappings claim any common address
    pub const fn overlaps(&self, other: &MemoryMapping) -> bool {
        self.begin <= other.end() && other.begin <= self.end()
    }
}
