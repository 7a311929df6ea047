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

//! Hardware aggregate
//!
//! Owns every controller of the machine. Controllers never hold references
//! to each other: when an access or event on one controller needs another,
//! the aggregate lends the collaborators for the duration of that call.
//! This is what the bus dispatches into and what interrupt handlers run on.

use super::{BootSource, MachineState};
use crate::core::cart::Cart;
use crate::core::dd::DdController;
use crate::core::is_viewer::IsViewer;
use crate::core::memory::{
    open_bus, resolve_pi_dma_handler, Backing, MemoryHandler, PiDmaHandler, RegionHandlers,
    RegionKind,
};
use crate::core::pif::{hle_boot, Pif};
use crate::core::r4300::{
    Cp0, InterruptKind, R4300, CAUSE_EXCCODE_MASK, CAUSE_IP4, CAUSE_IP7, STATUS_BEV, STATUS_ERL,
    STATUS_IM4, STATUS_SR, STATUS_TS,
};
use crate::core::rcp::{
    AiController, MiController, PiController, PiDmaDirection, PiDmaRequest, Rdp, RiController,
    Rsp, SiController, SiDmaDirection, SiDmaRequest, ViController,
};
use crate::core::rdram::Rdram;

/// Status bit cleared together with SR and TS by the reset signals
const STATUS_RP_CLEAR: u32 = 0x0008_0000;

/// Every controller of one machine
///
/// Fields are listed in composition order.
pub struct Hardware {
    pub rdram: Rdram,
    pub r4300: R4300,
    pub dp: Rdp,
    pub sp: Rsp,
    pub ai: AiController,
    pub mi: MiController,
    pub pi: PiController,
    pub ri: RiController,
    pub si: SiController,
    pub vi: ViController,
    pub pif: Pif,
    pub cart: Cart,
    pub dd: Option<DdController>,
    pub is_viewer: IsViewer,

    /// Image the boot vector is taken from, fixed at composition
    pub(super) boot_source: BootSource,

    /// Lifecycle state
    pub(super) state: MachineState,
}

impl Hardware {
    /// Reset every controller to its power-on state
    ///
    /// Controllers are reset in composition order; the disk drive only when
    /// present. Afterwards the periodic events are scheduled and the boot
    /// image's IPL3 is placed in SP memory.
    pub fn poweron(&mut self) {
        self.rdram.poweron();
        self.r4300.poweron();
        self.dp.poweron();
        self.sp.poweron();
        self.ai.poweron();
        self.mi.poweron();
        self.pi.poweron();
        self.ri.poweron();
        self.si.poweron();
        self.vi.poweron();
        self.pif.poweron();
        self.cart.poweron();
        if let Some(dd) = &mut self.dd {
            dd.poweron(&mut self.r4300);
        }
        self.is_viewer.poweron();

        self.r4300.events.add(InterruptKind::Vi, self.vi.next_vi());
        self.r4300.schedule_compare();
        self.boot();

        log::info!(
            "Powered on: {} bytes RDRAM, boot from {:?}",
            self.rdram.size(),
            self.boot_source
        );
    }

    /// Image supplying the boot vector
    pub fn boot_source(&self) -> BootSource {
        self.boot_source
    }

    /// Byte view of a host export backing store
    ///
    /// Register files are viewed in host byte order; memories are stored
    /// big-endian. A disk drive backing of a machine without one is empty.
    pub fn backing(&self, backing: Backing) -> &[u8] {
        match backing {
            Backing::Rdram => self.rdram.dram(),
            Backing::RdramRegs => self.rdram.regs.as_bytes(),
            Backing::SpMem => self.sp.mem(),
            Backing::SpRegs => self.sp.regs.as_bytes(),
            Backing::SpRegs2 => self.sp.regs2.as_bytes(),
            Backing::DpcRegs => self.dp.dpc_regs.as_bytes(),
            Backing::DpsRegs => self.dp.dps_regs.as_bytes(),
            Backing::MiRegs => self.mi.regs.as_bytes(),
            Backing::ViRegs => self.vi.regs.as_bytes(),
            Backing::AiRegs => self.ai.regs.as_bytes(),
            Backing::PiRegs => self.pi.regs.as_bytes(),
            Backing::RiRegs => self.ri.regs.as_bytes(),
            Backing::SiRegs => self.si.regs.as_bytes(),
            Backing::Sram => self.cart.sram.data(),
            Backing::FlashRam => self.cart.flashram.data(),
            Backing::CartRom => self.cart.rom(),
            Backing::DdRegs => self.dd.as_ref().map(|dd| dd.asic_bytes()).unwrap_or(&[]),
            Backing::DdRom => self.dd.as_ref().map(|dd| dd.rom()).unwrap_or(&[]),
            Backing::PifRom => self.pif.rom(),
            Backing::PifRam => self.pif.ram(),
        }
    }

    /// High-level boot from the selected image
    fn boot(&mut self) {
        let rom = match (self.boot_source, &self.dd) {
            (BootSource::DiskDrive, Some(dd)) => dd.rom(),
            _ => self.cart.rom(),
        };
        hle_boot(rom, self.sp.mem_mut(), &mut self.r4300);
    }

    /// Perform a PI transfer through the handler resolved for its address
    fn execute_pi_dma(&mut self, request: PiDmaRequest) {
        let PiDmaRequest {
            direction,
            cart_address,
            dram_address,
            length,
        } = request;

        log::debug!(
            "PI: DMA {:?} cart 0x{:08X} dram 0x{:06X} len 0x{:X}",
            direction,
            cart_address,
            dram_address,
            length
        );

        match (resolve_pi_dma_handler(cart_address, self.dd.is_some()), direction) {
            (Some(PiDmaHandler::CartRom), PiDmaDirection::FromCart) => {
                self.cart
                    .rom_dma_to_dram(cart_address, &mut self.rdram, dram_address, length);
            }
            (Some(PiDmaHandler::CartRom), PiDmaDirection::ToCart) => {
                log::debug!("PI: write DMA to cartridge ROM ignored");
            }
            (Some(PiDmaHandler::CartDom2), PiDmaDirection::FromCart) => {
                self.cart
                    .dom2_dma_to_dram(cart_address, &mut self.rdram, dram_address, length);
            }
            (Some(PiDmaHandler::CartDom2), PiDmaDirection::ToCart) => {
                self.cart
                    .dom2_dma_from_dram(cart_address, &self.rdram, dram_address, length);
            }
            (Some(PiDmaHandler::CartDom3), _) => {
                log::trace!("PI: DOM3 transfer at 0x{:08X} moves no data", cart_address);
            }
            (Some(PiDmaHandler::DiskDrive), direction) => {
                if let Some(dd) = &mut self.dd {
                    match direction {
                        PiDmaDirection::FromCart => {
                            dd.dma_to_dram(cart_address, &mut self.rdram, dram_address, length)
                        }
                        PiDmaDirection::ToCart => {
                            dd.dma_from_dram(cart_address, &self.rdram, dram_address, length)
                        }
                    }
                }
            }
            (None, _) => {
                log::warn!("PI: no DMA handler for cartridge address 0x{:08X}", cart_address);
            }
        }

        self.r4300
            .schedule(InterruptKind::Pi, PiController::dma_duration(length));
    }

    /// Perform an SI transfer between RDRAM and PIF RAM
    fn execute_si_dma(&mut self, request: SiDmaRequest) {
        match request.direction {
            SiDmaDirection::PifToDram => {
                self.pif.dma_to_dram(&mut self.rdram, request.dram_address)
            }
            SiDmaDirection::DramToPif => {
                self.pif.dma_from_dram(&self.rdram, request.dram_address)
            }
        }
        self.r4300
            .schedule(InterruptKind::Si, self.si.dma_duration());
    }

    pub(super) fn vi_event(&mut self) {
        self.vi.vertical_interrupt(&mut self.mi, &mut self.r4300);
    }

    pub(super) fn compare_event(&mut self) {
        self.r4300.cp0.set_interrupt_line(CAUSE_IP7, true);
        self.r4300.schedule_compare();
    }

    pub(super) fn check_event(&mut self) {
        log::trace!("Check checkpoint at {}", self.r4300.cycles());
    }

    pub(super) fn si_event(&mut self) {
        self.si.end_of_dma(&mut self.mi, &mut self.r4300.cp0);
    }

    pub(super) fn pi_event(&mut self) {
        self.pi.end_of_dma(&mut self.mi, &mut self.r4300.cp0);
    }

    pub(super) fn special_event(&mut self) {
        log::trace!("Special checkpoint, Count 0x{:08X}", self.r4300.cp0.count());
    }

    pub(super) fn ai_event(&mut self) {
        self.ai.end_of_dma(&self.rdram, &mut self.mi, &mut self.r4300);
    }

    pub(super) fn sp_event(&mut self) {
        self.sp.task_done(&mut self.mi, &mut self.r4300);
    }

    pub(super) fn dp_event(&mut self) {
        self.dp.full_sync(&mut self.mi, &mut self.r4300);
    }

    /// Reset button pressed: the PIF raises the pre-NMI line
    pub(super) fn hw2_event(&mut self) {
        log::info!("Reset signal (pre-NMI)");
        let regs = &mut self.r4300.cp0.regs;
        regs[Cp0::STATUS] =
            (regs[Cp0::STATUS] & !(STATUS_SR | STATUS_TS | STATUS_RP_CLEAR)) | STATUS_IM4;
        regs[Cp0::CAUSE] &= !CAUSE_EXCCODE_MASK;
        self.r4300.cp0.set_interrupt_line(CAUSE_IP4, true);
    }

    /// Soft reset through the boot vector
    pub(super) fn nmi_event(&mut self) {
        log::info!("Soft reset (NMI)");
        let pc = self.r4300.pc();

        let regs = &mut self.r4300.cp0.regs;
        regs[Cp0::STATUS] = (regs[Cp0::STATUS] & !(STATUS_SR | STATUS_TS | STATUS_RP_CLEAR))
            | STATUS_ERL
            | STATUS_BEV
            | STATUS_SR;
        regs[Cp0::CAUSE] = 0;
        regs[Cp0::ERROR_EPC] = pc;
        regs[Cp0::COUNT] = 0;

        self.r4300.events.clear();
        self.vi.restart(self.r4300.cycles());
        self.r4300.events.add(InterruptKind::Vi, self.vi.next_vi());
        self.r4300.schedule_compare();

        self.ai.clear_queue();
        self.pif.ram_mut().fill(0);
        self.boot();
    }

    /// Full power-on, taken at a checkpoint
    pub(super) fn reset_hard_event(&mut self) {
        log::info!("Hard reset");
        let previous = self.state;
        self.state = MachineState::Resetting;
        self.poweron();
        self.state = previous;
    }

    pub(super) fn rsp_dma_event(&mut self) {
        self.sp.end_of_dma();
    }

    pub(super) fn dd_mecha_event(&mut self) {
        if let Some(dd) = &mut self.dd {
            dd.mecha_interrupt(&mut self.r4300.cp0);
        }
    }

    pub(super) fn dd_bm_event(&mut self) {
        if let Some(dd) = &mut self.dd {
            dd.bm_interrupt(&mut self.r4300.cp0);
        }
    }

    pub(super) fn dd_dv_event(&mut self) {
        if let Some(dd) = &mut self.dd {
            dd.disk_interrupt(&mut self.r4300.cp0);
        }
    }
}

impl RegionHandlers for Hardware {
    fn read(&mut self, kind: RegionKind, address: u32) -> u32 {
        match kind {
            RegionKind::Nothing => open_bus(address),
            RegionKind::Rdram => self.rdram.read_dram(address),
            RegionKind::RdramRegs => self.rdram.regs.read_word(address),
            RegionKind::SpMem => self.sp.read_mem(address),
            RegionKind::SpRegs => self.sp.read_regs(address),
            RegionKind::SpRegs2 => self.sp.read_regs2(address),
            RegionKind::DpRegs => self.dp.read_dpc(address),
            RegionKind::DpsRegs => self.dp.read_dps(address),
            RegionKind::Mi => self.mi.read(address),
            RegionKind::Vi => self.vi.read(address, self.r4300.cycles()),
            RegionKind::Ai => self.ai.read(address, self.r4300.cycles()),
            RegionKind::Pi => self.pi.read(address),
            RegionKind::Ri => self.ri.read_word(address),
            RegionKind::Si => self.si.read(address),
            RegionKind::FlashramStatus => self.cart.read_dom2(address),
            RegionKind::CartRom => self.cart.read_rom(address),
            RegionKind::DdRegs => match &mut self.dd {
                Some(dd) => dd.read_regs(address),
                None => open_bus(address),
            },
            RegionKind::DdRom => match &self.dd {
                Some(dd) => dd.read_rom(address),
                None => open_bus(address),
            },
            RegionKind::Pif => self.pif.read(address),
            RegionKind::DebugViewer => self.is_viewer.read_word(address),
        }
    }

    fn write(&mut self, kind: RegionKind, address: u32, value: u32, mask: u32) {
        match kind {
            RegionKind::Nothing => {}
            RegionKind::Rdram => self.rdram.write_dram(address, value, mask),
            RegionKind::RdramRegs => self.rdram.regs.write_word(address, value, mask),
            RegionKind::SpMem => self.sp.write_mem(address, value, mask),
            RegionKind::SpRegs => self.sp.write_regs(
                address,
                value,
                mask,
                &mut self.rdram,
                &mut self.mi,
                &mut self.r4300,
            ),
            RegionKind::SpRegs2 => self.sp.write_regs2(address, value, mask),
            RegionKind::DpRegs => self.dp.write_dpc(
                address,
                value,
                mask,
                self.rdram.dram(),
                self.sp.mem(),
                &mut self.r4300,
            ),
            RegionKind::DpsRegs => self.dp.write_dps(address, value, mask),
            RegionKind::Mi => self.mi.write(address, value, mask, &mut self.r4300.cp0),
            RegionKind::Vi => self
                .vi
                .write(address, value, mask, &mut self.mi, &mut self.r4300),
            RegionKind::Ai => self.ai.write(
                address,
                value,
                mask,
                &self.rdram,
                &mut self.mi,
                &mut self.r4300,
            ),
            RegionKind::Pi => {
                let request = self
                    .pi
                    .write(address, value, mask, &mut self.mi, &mut self.r4300.cp0);
                if let Some(request) = request {
                    self.execute_pi_dma(request);
                }
            }
            RegionKind::Ri => self.ri.write_word(address, value, mask),
            RegionKind::Si => {
                let request = self
                    .si
                    .write(address, value, mask, &mut self.mi, &mut self.r4300.cp0);
                if let Some(request) = request {
                    self.execute_si_dma(request);
                }
            }
            RegionKind::FlashramStatus => self.cart.write_dom2(address, value, mask),
            RegionKind::CartRom => self.cart.write_rom(address, value, mask),
            RegionKind::DdRegs => {
                if let Some(dd) = &mut self.dd {
                    dd.write_regs(address, value, mask, &mut self.r4300);
                }
            }
            RegionKind::DdRom => {
                log::trace!("DD: write to IPL ROM at 0x{:08X} ignored", address);
            }
            RegionKind::Pif => self.pif.write(address, value, mask),
            RegionKind::DebugViewer => self.is_viewer.write_word(address, value, mask),
        }
    }
}
