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

//! Video Interface (VI)
//!
//! Generates the vertical interrupt once per field and reports the current
//! half-line. Frame output itself is not modelled.
//!
//! ## Timing
//!
//! One field lasts `VI_COUNT_RATE / expected_refresh_rate` cycles. The
//! current line is interpolated from the position inside that window:
//!
//! ```text
//! line = elapsed * (V_SYNC + 1) / delay
//! ```

use super::mi::{MiController, MiIntr};
use crate::core::memory::layout::VI_REGS_COUNT;
use crate::core::memory::{MemoryHandler, RegisterFile};
use crate::core::r4300::{InterruptKind, VirtualTime, R4300};

pub const VI_STATUS_REG: usize = 0;
pub const VI_ORIGIN_REG: usize = 1;
pub const VI_WIDTH_REG: usize = 2;
pub const VI_V_INTR_REG: usize = 3;
pub const VI_CURRENT_REG: usize = 4;
pub const VI_BURST_REG: usize = 5;
pub const VI_V_SYNC_REG: usize = 6;
pub const VI_H_SYNC_REG: usize = 7;
pub const VI_LEAP_REG: usize = 8;
pub const VI_H_START_REG: usize = 9;
pub const VI_V_START_REG: usize = 10;
pub const VI_V_BURST_REG: usize = 11;
pub const VI_X_SCALE_REG: usize = 12;
pub const VI_Y_SCALE_REG: usize = 13;

/// CPU cycles per second seen by the video timing
pub const VI_COUNT_RATE: u64 = 46_875_000;

/// Video interface
pub struct ViController {
    pub regs: RegisterFile<VI_REGS_COUNT>,

    /// Video clock in Hz (NTSC or PAL)
    clock: u32,

    /// Cycles per field
    delay: u64,

    /// Virtual time of the next vertical interrupt
    next_vi: VirtualTime,

    /// Current interlace field
    field: u32,
}

impl ViController {
    /// Create a video interface
    ///
    /// # Arguments
    ///
    /// * `clock` - Video clock in Hz
    /// * `expected_refresh_rate` - Fields per second
    pub fn new(clock: u32, expected_refresh_rate: u32) -> Self {
        let delay = (VI_COUNT_RATE / expected_refresh_rate.max(1) as u64).max(1);
        Self {
            regs: RegisterFile::new(),
            clock,
            delay,
            next_vi: delay,
            field: 0,
        }
    }

    /// Clear registers and rewind the field timer
    pub fn poweron(&mut self) {
        self.regs.reset();
        self.next_vi = self.delay;
        self.field = 0;
    }

    /// Video clock in Hz
    pub fn clock(&self) -> u32 {
        self.clock
    }

    /// Cycles per field
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// Virtual time of the next vertical interrupt
    pub fn next_vi(&self) -> VirtualTime {
        self.next_vi
    }

    /// Rewind the field timer relative to `now`
    pub fn restart(&mut self, now: VirtualTime) {
        self.next_vi = now + self.delay;
    }

    /// Read a VI register at virtual time `now`
    pub fn read(&mut self, address: u32, now: VirtualTime) -> u32 {
        match RegisterFile::<VI_REGS_COUNT>::index(address) {
            VI_CURRENT_REG => self.current_line(now),
            _ => self.regs.read_word(address),
        }
    }

    /// Write a VI register
    ///
    /// Any write to VI_CURRENT acknowledges the vertical interrupt.
    pub fn write(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        mi: &mut MiController,
        r4300: &mut R4300,
    ) {
        match RegisterFile::<VI_REGS_COUNT>::index(address) {
            VI_CURRENT_REG => mi.clear(MiIntr::VI, &mut r4300.cp0),
            _ => self.regs.write_word(address, value, mask),
        }
    }

    /// Vertical interrupt event: raise VI and schedule the next field
    pub fn vertical_interrupt(&mut self, mi: &mut MiController, r4300: &mut R4300) {
        if self.regs.get(VI_STATUS_REG) & 0x40 != 0 {
            self.field ^= 1;
        } else {
            self.field = 0;
        }

        mi.raise(MiIntr::VI, &mut r4300.cp0);

        self.next_vi += self.delay;
        r4300.events.add(InterruptKind::Vi, self.next_vi);
    }

    /// Current half-line, with the field in bit 0
    fn current_line(&self, now: VirtualTime) -> u32 {
        let v_sync = (self.regs.get(VI_V_SYNC_REG) & 0x3FF) as u64;
        if v_sync == 0 || self.delay == 0 {
            return 0;
        }

        let remaining = self.next_vi.saturating_sub(now).min(self.delay);
        let elapsed = self.delay - remaining;
        let line = (elapsed * (v_sync + 1) / self.delay) as u32;

        (line & !1) | self.field
    }
}
