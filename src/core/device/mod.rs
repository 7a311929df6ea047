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

//! Device composition and lifecycle
//!
//! [`Device`] is the composition root of the machine. It owns the bus, the
//! hardware aggregate and the execution core, and exposes the lifecycle
//! entry points a frontend drives:
//!
//! | State     | Operation          | Next state |
//! |-----------|--------------------|------------|
//! | (none)    | `compose`          | Built      |
//! | Built     | `poweron`          | Powered    |
//! | Powered   | `run`              | Running    |
//! | Running   | stop observed      | Stopped    |
//! | Stopped   | `run`              | Running    |
//! | Stopped   | `poweron`          | Powered    |
//!
//! `Resetting` is entered transiently while a hard reset is performed at an
//! interrupt checkpoint.
//!
//! # Example
//!
//! ```
//! use n64rx::core::config::{Backends, MachineConfig, Media};
//! use n64rx::core::device::{Device, MachineState};
//! use n64rx::core::r4300::FetchCore;
//!
//! let mut rom = vec![0u8; 0x1000];
//! rom[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
//!
//! let backends = Backends {
//!     core: Box::new(FetchCore::with_budget(100)),
//!     ..Backends::default()
//! };
//! let mut device = Device::compose(&MachineConfig::default(), Media::cartridge(rom), backends);
//!
//! device.poweron();
//! device.run();
//! assert_eq!(device.state(), MachineState::Stopped);
//! ```

mod hardware;
mod interrupts;

#[cfg(test)]
mod tests;

pub use hardware::Hardware;
pub use interrupts::{routing_table, ControllerId, InterruptHandler, InterruptTable};

use crate::core::cart::Cart;
use crate::core::config::{Backends, MachineConfig, Media};
use crate::core::dd::DdController;
use crate::core::is_viewer::IsViewer;
use crate::core::loader::{media_format, MEDIA_COMBO};
use crate::core::memory::{
    build_host_map, build_mappings, Backing, Bus, HostMemoryMap, MappingConfig,
};
use crate::core::pif::Pif;
use crate::core::r4300::{self, ExecutionCore, InterruptKind, StopHandle, R4300};
use crate::core::rcp::{
    AiController, MiController, PiController, Rdp, RiController, Rsp, SiController, ViController,
};
use crate::core::rdram::Rdram;

/// Delay between the reset signal and the NMI of a soft reset, in CPU cycles
pub const SOFT_RESET_NMI_DELAY: u64 = 50_000_000;

/// Lifecycle state of a composed machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// Composed, never powered on
    Built,
    /// Powered on, not running
    Powered,
    /// Inside [`Device::run`]
    Running,
    /// `run` returned after a stop request
    Stopped,
    /// Hard reset in progress
    Resetting,
}

/// Image supplying the boot vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootSource {
    /// Cartridge ROM
    Cart,
    /// Disk drive IPL ROM
    DiskDrive,
}

impl BootSource {
    /// Decide which image boots the machine
    ///
    /// The disk drive boots when its ROM is present and the cartridge is
    /// either absent or not a combo cartridge (media format 'C').
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::device::BootSource;
    ///
    /// let mut combo = vec![0u8; 0x40];
    /// combo[0x3B] = b'C';
    ///
    /// assert_eq!(BootSource::select(&[], &[0; 4]), BootSource::DiskDrive);
    /// assert_eq!(BootSource::select(&combo, &[0; 4]), BootSource::Cart);
    /// assert_eq!(BootSource::select(&combo, &[]), BootSource::Cart);
    /// ```
    pub fn select(cart_rom: &[u8], dd_rom: &[u8]) -> Self {
        let combo = media_format(cart_rom) == Some(MEDIA_COMBO);
        if !dd_rom.is_empty() && (cart_rom.is_empty() || !combo) {
            BootSource::DiskDrive
        } else {
            BootSource::Cart
        }
    }
}

/// Composed machine
pub struct Device {
    /// Address bus over the mapping table
    bus: Bus,

    /// Every controller
    hw: Hardware,

    /// Instruction execution strategy
    core: Box<dyn ExecutionCore>,

    /// Memory map exported to the host at composition
    host_map: HostMemoryMap,
}

impl Device {
    /// Compose a machine
    ///
    /// Controllers are created in dependency order, then the mapping table,
    /// the bus and the interrupt routing table are built and the routing
    /// table is registered with the CPU core. The host memory map is exported
    /// once to the host environment, if there is one.
    ///
    /// Without a disk drive ROM no disk drive is created: it appears neither
    /// in the mapping table nor in the routing table.
    ///
    /// # Panics
    ///
    /// Panics if `config` does not pass [`MachineConfig::validate`] or an
    /// image does not fit its address window.
    pub fn compose(config: &MachineConfig, media: Media, backends: Backends) -> Self {
        if let Err(e) = config.validate() {
            panic!("cannot compose machine: {}", e);
        }

        let Backends {
            core,
            audio,
            clock,
            sram,
            flashram,
            dd_disk,
            joybus,
            host,
        } = backends;
        let Media { rom, dd_rom } = media;

        let boot_source = BootSource::select(&rom, &dd_rom);
        let mappings = build_mappings(&MappingConfig {
            dram_size: config.dram_size,
            rom_size: rom.len(),
            dd_rom_size: dd_rom.len(),
        });

        let rdram = Rdram::new(config.dram_size);
        let mut r4300 = R4300::new(config.count_per_op);
        let dp = Rdp::new();
        let sp = Rsp::new();
        let ai = AiController::new(audio, config.vi_clock, config.ai_dma_modifier);
        let mi = MiController::new();
        let pi = PiController::new();
        let ri = RiController::new();
        let si = SiController::new(config.si_dma_duration as u64);
        let vi = ViController::new(config.vi_clock, config.expected_refresh_rate);
        let pif = Pif::new(joybus);
        let cart = Cart::new(rom, config.save_type, sram, flashram);
        let dd = if dd_rom.is_empty() {
            None
        } else {
            Some(DdController::new(dd_rom, clock, dd_disk))
        };

        let bus = Bus::new(mappings);
        r4300.register_interrupt_handlers(routing_table(dd.is_some()));

        let hw = Hardware {
            rdram,
            r4300,
            dp,
            sp,
            ai,
            mi,
            pi,
            ri,
            si,
            vi,
            pif,
            cart,
            dd,
            is_viewer: IsViewer::new(),
            boot_source,
            state: MachineState::Built,
        };

        let host_map = build_host_map(bus.mappings(), config.save_type);
        if let Some(mut host) = host {
            if !host.set_memory_maps(&host_map) {
                log::debug!("Host environment did not take the memory map");
            }
        }

        log::info!(
            "Machine composed ({}, boot from {:?}, core: {})",
            if hw.dd.is_some() { "with disk drive" } else { "cartridge only" },
            boot_source,
            core.name()
        );

        Self {
            bus,
            hw,
            core,
            host_map,
        }
    }

    /// Reset every controller to its power-on state
    ///
    /// # Panics
    ///
    /// Panics while the machine is running.
    pub fn poweron(&mut self) {
        assert!(
            self.hw.state != MachineState::Running,
            "cannot power on a running machine"
        );
        self.hw.poweron();
        self.hw.state = MachineState::Powered;
    }

    /// Run the execution core until a stop request is observed
    ///
    /// Blocks the calling thread. A stop requested before entry is
    /// discarded; use a [`StopHandle`] to stop the machine while it runs.
    ///
    /// # Panics
    ///
    /// Panics if the machine has not been powered on.
    pub fn run(&mut self) {
        assert!(
            matches!(self.hw.state, MachineState::Powered | MachineState::Stopped),
            "cannot run a machine in state {:?}",
            self.hw.state
        );
        self.hw.state = MachineState::Running;
        r4300::run(&self.bus, &mut self.hw, self.core.as_mut());
        self.hw.state = MachineState::Stopped;
    }

    /// Request the execution loop to exit
    ///
    /// Only sets the deferred stop flag; the loop observes it after its
    /// current step.
    pub fn stop(&self) {
        log::info!("Stop requested");
        self.hw.r4300.request_stop();
    }

    /// Handle for stopping the machine from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.hw.r4300.stop_handle()
    }

    /// Request a full reset at the next interrupt checkpoint
    pub fn hard_reset(&mut self) {
        log::info!("Hard reset requested");
        self.hw.r4300.request_hard_reset();
    }

    /// Press the reset button
    ///
    /// Schedules the reset signal now and the NMI
    /// [`SOFT_RESET_NMI_DELAY`] cycles later.
    pub fn soft_reset(&mut self) {
        log::info!("Soft reset requested");
        self.hw.r4300.schedule(InterruptKind::Hw2, 0);
        self.hw
            .r4300
            .schedule(InterruptKind::Nmi, SOFT_RESET_NMI_DELAY);
    }

    pub fn state(&self) -> MachineState {
        self.hw.state
    }

    pub fn boot_source(&self) -> BootSource {
        self.hw.boot_source
    }

    /// Read-only view of every controller
    pub fn hardware(&self) -> &Hardware {
        &self.hw
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Memory map exported at composition
    pub fn host_memory_map(&self) -> &HostMemoryMap {
        &self.host_map
    }

    /// Bytes behind a host export descriptor
    pub fn backing(&self, backing: Backing) -> &[u8] {
        self.hw.backing(backing)
    }

    /// Execution core plugged into the machine
    pub fn core(&self) -> &dyn ExecutionCore {
        self.core.as_ref()
    }
}
