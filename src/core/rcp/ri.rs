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

//! RDRAM Interface (RI)

use crate::core::memory::layout::RI_REGS_COUNT;
use crate::core::memory::{MemoryHandler, RegisterFile};

pub const RI_MODE_REG: usize = 0;
pub const RI_CONFIG_REG: usize = 1;
pub const RI_CURRENT_LOAD_REG: usize = 2;
pub const RI_SELECT_REG: usize = 3;
pub const RI_REFRESH_REG: usize = 4;
pub const RI_LATENCY_REG: usize = 5;
pub const RI_ERROR_REG: usize = 6;
pub const RI_WERROR_REG: usize = 7;

/// RDRAM interface
///
/// Configuration only; the register values have no effect on timing.
#[derive(Debug, Default)]
pub struct RiController {
    pub regs: RegisterFile<RI_REGS_COUNT>,
}

impl RiController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poweron(&mut self) {
        self.regs.reset();
    }
}

impl MemoryHandler for RiController {
    fn read_word(&mut self, address: u32) -> u32 {
        self.regs.read_word(address)
    }

    fn write_word(&mut self, address: u32, value: u32, mask: u32) {
        self.regs.write_word(address, value, mask);
    }

    fn name(&self) -> &str {
        "RI"
    }
}
