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

//! Nintendo 64 machine core library
//!
//! This library provides the composition root of an N64 machine: the
//! physical address bus and its mapping table, the RCP and cartridge
//! controllers, the VR4300 interrupt scheduler and the device lifecycle.
//! Instruction execution is supplied by an
//! [`ExecutionCore`](core::r4300::ExecutionCore) plugged in at composition.
//!
//! # Example
//!
//! ```
//! use n64rx::core::config::{Backends, MachineConfig, Media};
//! use n64rx::core::device::Device;
//! use n64rx::core::r4300::FetchCore;
//!
//! let mut rom = vec![0u8; 0x1000];
//! rom[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
//!
//! let backends = Backends {
//!     core: Box::new(FetchCore::with_budget(1000)),
//!     ..Backends::default()
//! };
//! let mut device = Device::compose(&MachineConfig::default(), Media::cartridge(rom), backends);
//! device.poweron();
//! device.run();
//! ```

pub mod core;
