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

//! Core emulation components
//!
//! This module contains every part of the machine:
//! - Memory bus, mapping table and host memory map export
//! - VR4300 shell: CP0, virtual time and the interrupt event queue
//! - RCP interfaces (MI, VI, AI, PI, RI, SI, SP, DP)
//! - RDRAM, PIF, cartridge save media, disk drive and debug viewer
//! - Device composition and lifecycle

pub mod backend;
pub mod cart;
pub mod config;
pub mod dd;
pub mod device;
pub mod error;
pub mod is_viewer;
pub mod loader;
pub mod memory;
pub mod pif;
pub mod r4300;
pub mod rcp;
pub mod rdram;

// Re-export commonly used types
pub use config::{Backends, MachineConfig, Media, SaveType};
pub use device::{Device, MachineState};
pub use error::{EmulatorError, Result};
pub use memory::Bus;
pub use r4300::{ExecutionCore, FetchCore, StopHandle};
