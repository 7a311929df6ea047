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

//! Test fixtures for common test scenarios

use std::cell::RefCell;
use std::rc::Rc;

use n64rx::core::config::{Backends, MachineConfig, Media, DRAM_SIZE_4M};
use n64rx::core::device::Device;
use n64rx::core::memory::{HostEnvironment, HostMemoryDescriptor};
use n64rx::core::r4300::{ExecutionCore, SystemBus};

use super::test_roms::{cart_rom, CART_SIZE};

/// Machine configuration with 4 MiB RDRAM
#[allow(dead_code)]
pub fn small_config() -> MachineConfig {
    MachineConfig {
        dram_size: DRAM_SIZE_4M,
        ..MachineConfig::default()
    }
}

/// Cartridge-only machine driven by `core`
#[allow(dead_code)]
pub fn cart_device_with_core(core: Box<dyn ExecutionCore>) -> Device {
    let backends = Backends {
        core,
        ..Backends::default()
    };
    Device::compose(&small_config(), Media::cartridge(cart_rom(CART_SIZE)), backends)
}

/// Host environment keeping a copy of every map it is offered
#[allow(dead_code)]
pub struct RecordingHost {
    pub offers: Rc<RefCell<Vec<Vec<HostMemoryDescriptor>>>>,
}

impl HostEnvironment for RecordingHost {
    fn set_memory_maps(&mut self, descriptors: &[HostMemoryDescriptor]) -> bool {
        self.offers.borrow_mut().push(descriptors.to_vec());
        true
    }
}

/// One step of a scripted core
#[allow(dead_code)]
pub type ScriptStep = Box<dyn FnMut(&mut SystemBus<'_>) -> u32>;

/// Execution core running a fixed list of steps, then stopping the loop
#[allow(dead_code)]
pub struct ScriptCore {
    steps: std::vec::IntoIter<ScriptStep>,
}

impl ScriptCore {
    #[allow(dead_code)]
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter(),
        }
    }
}

impl ExecutionCore for ScriptCore {
    fn step(&mut self, bus: &mut SystemBus<'_>) -> u32 {
        match self.steps.next() {
            Some(mut step) => step(bus),
            None => {
                bus.request_stop();
                0
            }
        }
    }

    fn name(&self) -> &str {
        "Script Core"
    }
}
