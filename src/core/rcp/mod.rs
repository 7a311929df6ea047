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

//! Reality Co-Processor interfaces
//!
//! Register-level models of the RCP blocks the CPU talks to:
//!
//! | Block | Registers   | Role                                          |
//! |-------|-------------|-----------------------------------------------|
//! | MI    | 0x04300000  | Interrupt status / mask hub                    |
//! | VI    | 0x04400000  | Video timing, vertical interrupt              |
//! | AI    | 0x04500000  | Audio DMA to the output backend               |
//! | PI    | 0x04600000  | DMA between RDRAM and cartridge / disk drive  |
//! | RI    | 0x04700000  | RDRAM interface configuration                 |
//! | SI    | 0x04800000  | DMA between RDRAM and PIF RAM                  |
//! | SP    | 0x04000000  | Signal processor memories, DMA and status     |
//! | DP    | 0x04100000  | Display processor command list registers      |
//!
//! Controllers take the collaborators they act on as explicit arguments
//! (the MI and CP0 for interrupts, RDRAM for DMA, the CPU shell for event
//! scheduling). Transfers that need media resolution (PI, SI) are returned
//! as requests and carried out by the device aggregate.

pub mod ai;
pub mod dp;
pub mod mi;
pub mod pi;
pub mod ri;
pub mod si;
pub mod sp;
pub mod vi;

pub use ai::AiController;
pub use dp::Rdp;
pub use mi::{MiController, MiIntr};
pub use pi::{PiController, PiDmaDirection, PiDmaRequest};
pub use ri::RiController;
pub use si::{SiController, SiDmaDirection, SiDmaRequest};
pub use sp::Rsp;
pub use vi::ViController;

/// Apply a command word made of clear/set bit pairs to a register
///
/// Each entry is `(clear_bit, set_bit, target)`: when `clear_bit` is present
/// in `command` the `target` bits are cleared, when `set_bit` is present
/// they are set. A value of 0 disables that half of the pair.
pub(crate) fn apply_set_clear(reg: &mut u32, command: u32, pairs: &[(u32, u32, u32)]) {
    for &(clear, set, target) in pairs {
        if clear != 0 && command & clear != 0 {
            *reg &= !target;
        }
        if set != 0 && command & set != 0 {
            *reg |= target;
        }
    }
}
