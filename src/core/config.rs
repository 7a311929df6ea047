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

//! Machine configuration
//!
//! Everything a machine is composed from, split by how it is supplied:
//!
//! - [`MachineConfig`]: plain settings, loadable from TOML
//! - [`Media`]: cartridge and disk drive ROM images
//! - [`Backends`]: collaborator handles (execution core, storage, clock,
//!   audio output, controller port devices, host environment)
//!
//! # TOML Format
//!
//! ```toml
//! dram_size = 8388608
//! count_per_op = 2
//! si_dma_duration = 2304
//! vi_clock = 48681812
//! expected_refresh_rate = 60
//! ai_dma_modifier = 1.0
//! save_type = "auto"
//! ```
//!
//! Every field is optional and falls back to its default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::backend::{
    AudioOutput, ClockBackend, JoybusDevice, MemoryStorage, NullAudio, StorageBackend,
    SystemClock, PERIPHERAL_PORTS,
};
use super::error::{EmulatorError, Result};
use super::memory::HostEnvironment;
use super::r4300::{ExecutionCore, FetchCore};
use super::rcp::vi::VI_COUNT_RATE;

/// 4 MiB RDRAM (no expansion pak)
pub const DRAM_SIZE_4M: usize = 0x40_0000;
/// 8 MiB RDRAM (expansion pak)
pub const DRAM_SIZE_8M: usize = 0x80_0000;

/// NTSC video clock in Hz
pub const VI_CLOCK_NTSC: u32 = 48_681_812;
/// PAL video clock in Hz
pub const VI_CLOCK_PAL: u32 = 49_656_530;

/// Declared cartridge save media
///
/// The raw values follow the frontend convention: -1 selects battery-backed
/// SRAM, 0 leaves the choice to runtime detection, 1 selects FlashRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    /// Battery-backed SRAM
    Sram,
    /// Detected from the first save media access
    #[default]
    Auto,
    /// FlashRAM
    FlashRam,
}

impl SaveType {
    /// Convert from the raw selector value
    ///
    /// # Returns
    ///
    /// `None` for values other than -1, 0 and 1
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(SaveType::Sram),
            0 => Some(SaveType::Auto),
            1 => Some(SaveType::FlashRam),
            _ => None,
        }
    }

    /// Raw selector value
    pub const fn as_raw(self) -> i32 {
        match self {
            SaveType::Sram => -1,
            SaveType::Auto => 0,
            SaveType::FlashRam => 1,
        }
    }
}

impl FromStr for SaveType {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sram" => Ok(SaveType::Sram),
            "auto" => Ok(SaveType::Auto),
            "flashram" | "flash" => Ok(SaveType::FlashRam),
            other => Err(EmulatorError::InvalidConfig(format!(
                "unknown save type '{}' (expected sram, auto or flashram)",
                other
            ))),
        }
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveType::Sram => "sram",
            SaveType::Auto => "auto",
            SaveType::FlashRam => "flashram",
        };
        f.write_str(name)
    }
}

/// Machine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Populated RDRAM in bytes (4 MiB or 8 MiB)
    pub dram_size: usize,

    /// CPU cycles per retired instruction
    pub count_per_op: u32,

    /// SI DMA duration in CPU cycles
    pub si_dma_duration: u32,

    /// Video clock in Hz (drives the audio sample rate)
    pub vi_clock: u32,

    /// Vertical interrupts per second
    pub expected_refresh_rate: u32,

    /// Scale applied to audio DMA durations
    pub ai_dma_modifier: f32,

    /// Declared cartridge save media
    pub save_type: SaveType,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            dram_size: DRAM_SIZE_8M,
            count_per_op: 2,
            si_dma_duration: 0x900,
            vi_clock: VI_CLOCK_NTSC,
            expected_refresh_rate: 60,
            ai_dma_modifier: 1.0,
            save_type: SaveType::Auto,
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::config::{MachineConfig, SaveType, DRAM_SIZE_4M};
    ///
    /// let config = MachineConfig::from_toml_str(r#"
    ///     dram_size = 4194304
    ///     save_type = "sram"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.dram_size, DRAM_SIZE_4M);
    /// assert_eq!(config.save_type, SaveType::Sram);
    /// assert_eq!(config.count_per_op, 2);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file
    ///
    /// # Returns
    ///
    /// - `Ok(MachineConfig)` if the file parses and validates
    /// - `Err(EmulatorError)` on I/O, parse or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loading machine configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EmulatorError::InvalidConfig(e.to_string()))
    }

    /// Set the RDRAM size in MiB
    pub fn set_dram_size_mb(&mut self, mb: usize) -> Result<()> {
        self.dram_size = mb
            .checked_mul(0x10_0000)
            .ok_or(EmulatorError::InvalidDramSize(mb))?;
        Ok(())
    }

    /// Check that every setting can be composed
    ///
    /// Composition treats an invalid configuration as a programming error;
    /// this is the place to reject user input as a value first.
    pub fn validate(&self) -> Result<()> {
        if self.dram_size != DRAM_SIZE_4M && self.dram_size != DRAM_SIZE_8M {
            return Err(EmulatorError::InvalidDramSize(self.dram_size));
        }
        if self.count_per_op == 0 {
            return Err(EmulatorError::InvalidConfig(
                "count_per_op must be at least 1".to_string(),
            ));
        }
        if self.vi_clock == 0 || self.expected_refresh_rate == 0 {
            return Err(EmulatorError::InvalidConfig(
                "vi_clock and expected_refresh_rate must be nonzero".to_string(),
            ));
        }
        if self.expected_refresh_rate as u64 > VI_COUNT_RATE {
            return Err(EmulatorError::InvalidConfig(format!(
                "expected_refresh_rate must not exceed {} (got {})",
                VI_COUNT_RATE, self.expected_refresh_rate
            )));
        }
        if !(self.ai_dma_modifier.is_finite() && self.ai_dma_modifier > 0.0) {
            return Err(EmulatorError::InvalidConfig(format!(
                "ai_dma_modifier must be positive (got {})",
                self.ai_dma_modifier
            )));
        }
        Ok(())
    }
}

/// ROM images the machine is composed with
///
/// Images are expected in big-endian (z64) byte order; see
/// [`loader`](crate::core::loader) for normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    /// Cartridge ROM image, empty when no cartridge is inserted
    pub rom: Vec<u8>,
    /// Disk drive IPL ROM image, empty when no disk drive is attached
    pub dd_rom: Vec<u8>,
}

impl Media {
    /// Media with a cartridge only
    pub fn cartridge(rom: Vec<u8>) -> Self {
        Self {
            rom,
            dd_rom: Vec::new(),
        }
    }

    /// Check whether a disk drive is attached
    pub fn has_disk_drive(&self) -> bool {
        !self.dd_rom.is_empty()
    }
}

/// Collaborator handles supplied at composition
pub struct Backends {
    /// Instruction execution strategy
    pub core: Box<dyn ExecutionCore>,

    /// Audio sample sink
    pub audio: Box<dyn AudioOutput>,

    /// Real-time clock read by the disk drive
    pub clock: Box<dyn ClockBackend>,

    /// Persistent storage behind cartridge SRAM
    pub sram: Box<dyn StorageBackend>,

    /// Persistent storage behind cartridge FlashRAM
    pub flashram: Box<dyn StorageBackend>,

    /// Disk image storage, when a disk is inserted in the disk drive
    pub dd_disk: Option<Box<dyn StorageBackend>>,

    /// Devices plugged into the controller ports
    pub joybus: [Option<Box<dyn JoybusDevice>>; PERIPHERAL_PORTS],

    /// Host environment receiving the memory map export
    pub host: Option<Box<dyn HostEnvironment>>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            core: Box::new(FetchCore::new()),
            audio: Box::new(NullAudio),
            clock: Box::new(SystemClock),
            sram: Box::new(MemoryStorage::new()),
            flashram: Box::new(MemoryStorage::new()),
            dd_disk: None,
            joybus: Default::default(),
            host: None,
        }
    }
}
