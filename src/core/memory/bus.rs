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

//! Address bus and dispatcher
//!
//! The bus resolves a physical address to the mapping table slot that owns
//! it and hands the access to whoever implements [`RegionHandlers`]. It never
//! owns devices itself, so the device aggregate can lend itself mutably for
//! the duration of one access while the bus is borrowed immutably.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │             Bus              │
//! │  mappings: [MemoryMapping]   │      ┌───────────────────────┐
//! │  pages:    [u8; 65536]  ─────┼─────▶│ RegionHandlers        │
//! │                              │ kind │  (device aggregate)   │
//! │  Nothing ─▶ open bus         │      └───────────────────────┘
//! └──────────────────────────────┘
//! ```

use super::map::{MappingTable, MAPPING_COUNT};
use super::open_bus;
use super::region::{MemoryMapping, RegionKind};

/// Receiver of routed bus accesses
///
/// Implemented by the device aggregate: every region kind other than
/// [`RegionKind::Nothing`] is forwarded here together with the full physical
/// address.
pub trait RegionHandlers {
    /// Read the 32-bit word at `address` from the device behind `kind`
    fn read(&mut self, kind: RegionKind, address: u32) -> u32;

    /// Write the bits of `value` selected by `mask` at `address`
    fn write(&mut self, kind: RegionKind, address: u32, value: u32, mask: u32);
}

/// Number of 64 KiB pages in the 32-bit physical address space
const PAGE_COUNT: usize = 0x1_0000;

/// Memory bus routing every physical access
///
/// Built once at composition from a [`MappingTable`] and never mutated
/// afterwards.
pub struct Bus {
    /// Mapping table, slot 0 is the open-bus catch-all
    mappings: MappingTable,

    /// Highest-priority slot touching each 64 KiB page
    pages: Box<[u8]>,
}

impl Bus {
    /// Create a bus over a mapping table
    ///
    /// Later slots take priority over earlier ones, so slot 0 (the catch-all)
    /// only answers where nothing else does.
    pub fn new(mappings: MappingTable) -> Self {
        let mut pages = vec![0u8; PAGE_COUNT].into_boxed_slice();

        for (slot, mapping) in mappings.iter().enumerate() {
            let first = (mapping.begin >> 16) as usize;
            let last = (mapping.end() >> 16) as usize;
            pages[first..=last].fill(slot as u8);
        }

        Self { mappings, pages }
    }

    /// Get the mapping table
    pub fn mappings(&self) -> &[MemoryMapping] {
        &self.mappings
    }

    /// Find the mapping that owns a physical address
    ///
    /// The page lookup answers in O(1); when a page is only partially covered
    /// by its winning slot the remaining slots are scanned from highest to
    /// lowest priority, ending at the catch-all.
    #[inline]
    pub fn region_at(&self, address: u32) -> &MemoryMapping {
        let slot = self.pages[(address >> 16) as usize] as usize;
        let mapping = &self.mappings[slot];
        if mapping.contains(address) {
            return mapping;
        }

        self.mappings[..slot]
            .iter()
            .rev()
            .find(|m| m.contains(address))
            .unwrap_or(&self.mappings[0])
    }

    /// Identify the region kind owning a physical address
    #[inline]
    pub fn kind_at(&self, address: u32) -> RegionKind {
        self.region_at(address).kind
    }

    /// Read a 32-bit word from a physical address
    ///
    /// Unclaimed addresses return the open-bus value and are not an error.
    pub fn read<H: RegionHandlers + ?Sized>(&self, handlers: &mut H, address: u32) -> u32 {
        match self.kind_at(address) {
            RegionKind::Nothing => {
                log::trace!("Open bus read at 0x{:08X}", address);
                open_bus(address)
            }
            kind => handlers.read(kind, address),
        }
    }

    /// Write the bits of `value` selected by `mask` to a physical address
    ///
    /// Writes to unclaimed addresses are discarded.
    pub fn write<H: RegionHandlers + ?Sized>(
        &self,
        handlers: &mut H,
        address: u32,
        value: u32,
        mask: u32,
    ) {
        match self.kind_at(address) {
            RegionKind::Nothing => {
                log::trace!(
                    "Open bus write at 0x{:08X} discarded (0x{:08X} & 0x{:08X})",
                    address,
                    value,
                    mask
                );
            }
            kind => handlers.write(kind, address, value, mask),
        }
    }
}

const _: () = assert!(MAPPING_COUNT <= u8::MAX as usize);
