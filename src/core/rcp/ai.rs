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

//! Audio Interface (AI)
//!
//! Streams sample buffers from RDRAM to the audio backend. The AI holds a
//! two-entry DMA FIFO: the head entry is playing, the second one is queued.
//! Each transfer lasts as long as its samples take to play at the DAC rate,
//! after which the AI interrupt is raised and the next entry starts.
//!
//! ## Registers
//!
//! ```text
//! Index | Name        | Notes
//! ------|-------------|-------------------------------------------
//! 0     | AI_DRAM_ADDR| Source of the next transfer
//! 1     | AI_LEN      | Writing queues a transfer; reads remaining length
//! 2     | AI_CONTROL  | DMA enable
//! 3     | AI_STATUS   | Busy / full; writing acknowledges the interrupt
//! 4     | AI_DACRATE  | Output frequency = vi_clock / (dacrate + 1)
//! 5     | AI_BITRATE  |
//! ```

use arrayvec::ArrayVec;

use super::mi::{MiController, MiIntr};
use crate::core::backend::AudioOutput;
use crate::core::memory::layout::AI_REGS_COUNT;
use crate::core::memory::{MemoryHandler, RegisterFile};
use crate::core::r4300::{InterruptKind, VirtualTime, R4300};
use crate::core::rdram::Rdram;
use crate::core::rcp::vi::VI_COUNT_RATE;

pub const AI_DRAM_ADDR_REG: usize = 0;
pub const AI_LEN_REG: usize = 1;
pub const AI_CONTROL_REG: usize = 2;
pub const AI_STATUS_REG: usize = 3;
pub const AI_DACRATE_REG: usize = 4;
pub const AI_BITRATE_REG: usize = 5;

/// DAC rate divider width
pub const AI_DACRATE_MASK: u32 = 0x3FFF;

pub const AI_STATUS_BUSY: u32 = 0x4000_0000;
pub const AI_STATUS_FULL: u32 = 0x8000_0000;

const AI_FIFO_DEPTH: usize = 2;

/// One queued audio transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AiDma {
    address: u32,
    length: u32,
    duration: u64,
}

/// Audio interface
pub struct AiController {
    pub regs: RegisterFile<AI_REGS_COUNT>,

    fifo: ArrayVec<AiDma, AI_FIFO_DEPTH>,

    /// Virtual time the head transfer started
    dma_start: VirtualTime,

    audio: Box<dyn AudioOutput>,

    /// Video clock the DAC rate divides
    vi_clock: u32,

    /// Scale applied to every transfer duration
    dma_modifier: f32,
}

impl AiController {
    pub fn new(audio: Box<dyn AudioOutput>, vi_clock: u32, dma_modifier: f32) -> Self {
        Self {
            regs: RegisterFile::new(),
            fifo: ArrayVec::new(),
            dma_start: 0,
            audio,
            vi_clock,
            dma_modifier,
        }
    }

    /// Clear registers and drop queued transfers
    pub fn poweron(&mut self) {
        self.regs.reset();
        self.fifo.clear();
        self.dma_start = 0;
    }

    /// Drop queued transfers, leaving the registers intact
    ///
    /// Clears the busy/full status after a soft reset so the next LEN write
    /// starts a transfer.
    pub fn clear_queue(&mut self) {
        self.fifo.clear();
    }

    /// Number of queued transfers, including the playing one
    pub fn queued(&self) -> usize {
        self.fifo.len()
    }

    /// Output frequency in Hz for the current DAC rate
    pub fn frequency(&self) -> u32 {
        let divider = (self.regs.get(AI_DACRATE_REG) & AI_DACRATE_MASK) + 1;
        self.vi_clock / divider
    }

    /// Read an AI register at virtual time `now`
    pub fn read(&mut self, address: u32, now: VirtualTime) -> u32 {
        match RegisterFile::<AI_REGS_COUNT>::index(address) {
            AI_LEN_REG => self.remaining_length(now),
            AI_STATUS_REG => self.status(),
            _ => self.regs.read_word(address),
        }
    }

    /// Write an AI register
    pub fn write(
        &mut self,
        address: u32,
        value: u32,
        mask: u32,
        rdram: &Rdram,
        mi: &mut MiController,
        r4300: &mut R4300,
    ) {
        match RegisterFile::<AI_REGS_COUNT>::index(address) {
            AI_LEN_REG => {
                self.regs.write_word(address, value, mask);
                self.push_dma(rdram, r4300);
            }
            AI_STATUS_REG => mi.clear(MiIntr::AI, &mut r4300.cp0),
            AI_DACRATE_REG => {
                let previous = self.regs.get(AI_DACRATE_REG);
                self.regs.write_word(address, value, mask);
                let dacrate = self.regs.get(AI_DACRATE_REG) & AI_DACRATE_MASK;
                self.regs.set(AI_DACRATE_REG, dacrate);
                if dacrate != previous {
                    let frequency = self.frequency();
                    log::debug!("AI: output frequency {} Hz", frequency);
                    self.audio.set_frequency(frequency);
                }
            }
            _ => self.regs.write_word(address, value, mask),
        }
    }

    /// End of the playing transfer: start the queued one and raise AI
    pub fn end_of_dma(&mut self, rdram: &Rdram, mi: &mut MiController, r4300: &mut R4300) {
        if !self.fifo.is_empty() {
            self.fifo.remove(0);
        }
        if !self.fifo.is_empty() {
            self.start_dma(rdram, r4300);
        }
        mi.raise(MiIntr::AI, &mut r4300.cp0);
    }

    fn status(&self) -> u32 {
        let mut status = 0;
        if !self.fifo.is_empty() {
            status |= AI_STATUS_BUSY;
        }
        if self.fifo.is_full() {
            status |= AI_STATUS_FULL;
        }
        status
    }

    fn push_dma(&mut self, rdram: &Rdram, r4300: &mut R4300) {
        let length = self.regs.get(AI_LEN_REG) & 0x3_FFF8;
        if length == 0 {
            return;
        }
        if self.fifo.is_full() {
            log::warn!("AI: FIFO full, dropping {} byte transfer", length);
            return;
        }

        let dma = AiDma {
            address: self.regs.get(AI_DRAM_ADDR_REG) & 0xFF_FFF8,
            length,
            duration: self.dma_duration(length),
        };
        self.fifo.push(dma);

        if self.fifo.len() == 1 {
            self.start_dma(rdram, r4300);
        }
    }

    fn start_dma(&mut self, rdram: &Rdram, r4300: &mut R4300) {
        let Some(&dma) = self.fifo.first() else {
            return;
        };

        let start = dma.address as usize;
        let end = (start + dma.length as usize).min(rdram.size());
        if let Some(samples) = rdram.dram().get(start..end) {
            self.audio.push_samples(samples);
        }

        self.dma_start = r4300.cycles();
        r4300.schedule(InterruptKind::Ai, dma.duration);
    }

    /// Cycles needed to play `length` bytes of 16-bit stereo samples
    fn dma_duration(&self, length: u32) -> u64 {
        let frequency = self.frequency().max(1) as u64;
        let samples = (length / 4) as u64;
        let cycles = samples * VI_COUNT_RATE / frequency;
        ((cycles as f64 * self.dma_modifier as f64) as u64).max(1)
    }

    /// Bytes of the playing transfer still to go
    fn remaining_length(&self, now: VirtualTime) -> u32 {
        let Some(dma) = self.fifo.first() else {
            return 0;
        };
        let elapsed = now.saturating_sub(self.dma_start).min(dma.duration);
        let played = (elapsed * dma.length as u64 / dma.duration) as u32;
        (dma.length - played) & !7
    }
}
