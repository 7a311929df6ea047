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

//! Backend interfaces
//!
//! Traits for the collaborators the machine talks to but does not implement:
//! persistent storage, the real-time clock, the audio sink and the devices
//! plugged into the controller ports. Simple implementations are provided
//! for tests and headless runs.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};

/// Number of controller ports on the PIF
pub const PERIPHERAL_PORTS: usize = 4;

/// Persistent storage behind a save media or disk image
///
/// The owning device keeps the working copy; the backend only loads it at
/// power-on and receives every committed change.
pub trait StorageBackend {
    /// Fill `buf` with the stored contents
    ///
    /// Leaves `buf` untouched when nothing has been stored yet.
    fn load(&mut self, buf: &mut [u8]);

    /// Persist `data`
    fn save(&mut self, data: &[u8]);
}

/// Real-time clock source
pub trait ClockBackend {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;
}

/// Audio sample sink
pub trait AudioOutput {
    /// Set the output sample rate in Hz
    fn set_frequency(&mut self, frequency: u32);

    /// Queue big-endian 16-bit stereo samples
    fn push_samples(&mut self, samples: &[u8]);
}

/// Device plugged into a controller port
pub trait JoybusDevice {
    /// Reset the device; devices without power-on state keep the default
    fn poweron(&mut self) {}

    /// Process one joybus command
    ///
    /// # Arguments
    ///
    /// * `tx` - Command bytes sent by the PIF
    /// * `rx` - Response buffer to fill
    ///
    /// # Returns
    ///
    /// `false` when the device does not answer the command
    fn process(&mut self, tx: &[u8], rx: &mut [u8]) -> bool;
}

/// Storage kept in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    /// Last saved contents (empty until the first save)
    pub data: Vec<u8>,
    /// Number of saves received
    pub saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `data`
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data, saves: 0 }
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&mut self, buf: &mut [u8]) {
        let len = self.data.len().min(buf.len());
        buf[..len].copy_from_slice(&self.data[..len]);
    }

    fn save(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
        self.saves += 1;
    }
}

/// Storage backed by a file on disk
///
/// A missing file loads as empty. I/O failures are logged; the machine has
/// no error channel to report them through.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl StorageBackend for FileStorage {
    fn load(&mut self, buf: &mut [u8]) {
        match std::fs::read(&self.path) {
            Ok(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                log::info!("Loaded {} bytes from {}", len, self.path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", self.path.display());
            }
            Err(e) => log::warn!("Failed to read {}: {}", self.path.display(), e),
        }
    }

    fn save(&mut self, data: &[u8]) {
        if let Err(e) = std::fs::write(&self.path, data) {
            log::error!("Failed to write {}: {}", self.path.display(), e);
        }
    }
}

/// Host system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockBackend for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl ClockBackend for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Audio sink discarding every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn set_frequency(&mut self, _frequency: u32) {}

    fn push_samples(&mut self, _samples: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_memory_storage_load_save() {
        let mut storage = MemoryStorage::with_data(vec![1, 2, 3]);
        let mut buf = [0xFFu8; 5];

        storage.load(&mut buf);
        assert_eq!(buf, [1, 2, 3, 0xFF, 0xFF]);

        storage.save(&[9, 9]);
        assert_eq!(storage.data, vec![9, 9]);
        assert_eq!(storage.saves, 1);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("game.sra"));

        let mut buf = [0xAAu8; 4];
        storage.load(&mut buf);
        assert_eq!(buf, [0xAA; 4], "missing file leaves buffer untouched");

        storage.save(&[1, 2, 3, 4]);
        let mut buf = [0u8; 4];
        storage.load(&mut buf);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_fixed_clock() {
        let instant = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();
        assert_eq!(FixedClock(instant).now(), instant);
    }
}
