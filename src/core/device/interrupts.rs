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

//! Interrupt routing table
//!
//! Connects every hardware event kind to the controller that handles it.
//! The table is built once at composition and handed to the CPU core, which
//! dispatches through it at each interrupt checkpoint.
//!
//! | Event      | Owner  | Effect                                       |
//! |------------|--------|----------------------------------------------|
//! | Vi         | VI     | raise MI VI, schedule next field             |
//! | Compare    | CP0    | assert IP7, schedule next Count wrap         |
//! | Check      | R4300  | none                                         |
//! | Si         | SI     | raise MI SI                                  |
//! | Pi         | PI     | raise MI PI                                  |
//! | Special    | R4300  | none                                         |
//! | Ai         | AI     | start queued transfer, raise MI AI           |
//! | Sp         | SP     | halt with break, raise MI SP if enabled      |
//! | Dp         | DP     | raise MI DP                                  |
//! | Hw2        | PIF    | assert IP4 (reset button pressed)            |
//! | Nmi        | R4300  | soft reset through the boot vector           |
//! | ResetHard  | Device | full power-on                                |
//! | RspDma     | SP     | clear SP DMA busy                            |
//! | DdMecha    | DD     | MECHA interrupt (disk drive only)            |
//! | DdBm       | DD     | BM interrupt (disk drive only)               |
//! | DdDv       | DD     | disk detection (disk drive only)             |

use super::hardware::Hardware;
use crate::core::r4300::InterruptKind;

/// Controller owning a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerId {
    Vi,
    R4300,
    Cp0,
    Si,
    Pi,
    Ai,
    Sp,
    Dp,
    Pif,
    Device,
    Dd,
}

/// One routing table entry
#[derive(Debug, Clone, Copy)]
pub struct InterruptHandler {
    /// Controller the handler acts on
    pub owner: ControllerId,

    /// Handler body, run with the whole hardware aggregate
    pub run: fn(&mut Hardware),
}

/// Event kind to handler table
///
/// Exactly one handler per routed kind; the disk drive kinds are absent
/// when no disk drive is composed.
#[derive(Debug, Clone)]
pub struct InterruptTable {
    entries: [Option<InterruptHandler>; InterruptKind::COUNT],
}

impl InterruptTable {
    /// Handler routed for `kind`
    #[inline]
    pub fn get(&self, kind: InterruptKind) -> Option<InterruptHandler> {
        self.entries[kind.index()]
    }

    /// Check whether `kind` is routed
    pub fn contains(&self, kind: InterruptKind) -> bool {
        self.entries[kind.index()].is_some()
    }

    /// Number of routed kinds
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Routed kinds with their handlers, in table order
    pub fn iter(&self) -> impl Iterator<Item = (InterruptKind, InterruptHandler)> + '_ {
        InterruptKind::ALL
            .iter()
            .filter_map(|&kind| self.get(kind).map(|handler| (kind, handler)))
    }
}

fn route(owner: ControllerId, run: fn(&mut Hardware)) -> Option<InterruptHandler> {
    Some(InterruptHandler { owner, run })
}

/// Build the routing table
///
/// # Arguments
///
/// * `disk_drive` - Whether a disk drive is composed; without one the three
///   disk drive kinds are left unrouted
pub fn routing_table(disk_drive: bool) -> InterruptTable {
    let mut entries = [None; InterruptKind::COUNT];

    entries[InterruptKind::Vi.index()] = route(ControllerId::Vi, Hardware::vi_event);
    entries[InterruptKind::Compare.index()] = route(ControllerId::Cp0, Hardware::compare_event);
    entries[InterruptKind::Check.index()] = route(ControllerId::R4300, Hardware::check_event);
    entries[InterruptKind::Si.index()] = route(ControllerId::Si, Hardware::si_event);
    entries[InterruptKind::Pi.index()] = route(ControllerId::Pi, Hardware::pi_event);
    entries[InterruptKind::Special.index()] = route(ControllerId::R4300, Hardware::special_event);
    entries[InterruptKind::Ai.index()] = route(ControllerId::Ai, Hardware::ai_event);
    entries[InterruptKind::Sp.index()] = route(ControllerId::Sp, Hardware::sp_event);
    entries[InterruptKind::Dp.index()] = route(ControllerId::Dp, Hardware::dp_event);
    entries[InterruptKind::Hw2.index()] = route(ControllerId::Pif, Hardware::hw2_event);
    entries[InterruptKind::Nmi.index()] = route(ControllerId::R4300, Hardware::nmi_event);
    entries[InterruptKind::ResetHard.index()] =
        route(ControllerId::Device, Hardware::reset_hard_event);
    entries[InterruptKind::RspDma.index()] = route(ControllerId::Sp, Hardware::rsp_dma_event);

    if disk_drive {
        entries[InterruptKind::DdMecha.index()] = route(ControllerId::Dd, Hardware::dd_mecha_event);
        entries[InterruptKind::DdBm.index()] = route(ControllerId::Dd, Hardware::dd_bm_event);
        entries[InterruptKind::DdDv.index()] = route(ControllerId::Dd, Hardware::dd_dv_event);
    }

    InterruptTable { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_without_disk_drive() {
        let table = routing_table(false);

        assert_eq!(table.len(), 13);
        assert!(!table.contains(InterruptKind::DdMecha));
        assert!(!table.contains(InterruptKind::DdBm));
        assert!(!table.contains(InterruptKind::DdDv));
        assert!(table.iter().all(|(kind, _)| !kind.is_disk_drive()));
    }

    #[test]
    fn test_table_with_disk_drive() {
        let table = routing_table(true);

        assert_eq!(table.len(), InterruptKind::COUNT);
        assert_eq!(
            table.get(InterruptKind::DdBm).map(|h| h.owner),
            Some(ControllerId::Dd)
        );
    }

    #[test]
    fn test_owners() {
        let table = routing_table(false);

        assert_eq!(table.get(InterruptKind::Vi).map(|h| h.owner), Some(ControllerId::Vi));
        assert_eq!(
            table.get(InterruptKind::Compare).map(|h| h.owner),
            Some(ControllerId::Cp0)
        );
        assert_eq!(
            table.get(InterruptKind::ResetHard).map(|h| h.owner),
            Some(ControllerId::Device)
        );
        assert_eq!(table.get(InterruptKind::Hw2).map(|h| h.owner), Some(ControllerId::Pif));
    }

    #[test]
    fn test_iter_in_table_order() {
        let kinds: Vec<_> = routing_table(false).iter().map(|(kind, _)| kind).collect();

        assert_eq!(kinds.first(), Some(&InterruptKind::Vi));
        assert_eq!(kinds.last(), Some(&InterruptKind::RspDma));
    }
}
