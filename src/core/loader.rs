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

//! ROM image loading
//!
//! This module handles loading of cartridge and disk drive ROM images:
//! - byte order detection and normalization to big-endian
//! - size validation against the address windows the images are mapped to
//! - cartridge header parsing
//!
//! # Byte Orders
//!
//! Cartridge dumps circulate in three byte orders, told apart by the first
//! word of the header:
//!
//! ```text
//! .z64  80 37 12 40   big-endian (native)
//! .v64  37 80 40 12   16-bit byte-swapped
//! .n64  40 12 37 80   32-bit little-endian
//! ```
//!
//! Everything past the loader sees big-endian images only.
//!
//! # Cartridge Header
//!
//! ```text
//! 0x00-0x03: PI domain 1 configuration
//! 0x08-0x0B: Entry point
//! 0x10-0x17: CRC1, CRC2
//! 0x20-0x33: Image name (ASCII, space padded)
//! 0x3B:      Media format ('N' cartridge, 'C' cartridge + disk combo, ...)
//! 0x3C-0x3D: Cartridge ID
//! 0x3E:      Region code
//! 0x3F:      Version
//! 0x40-0xFFF: IPL3 boot code
//! ```
//!
//! # Example
//!
//! ```
//! use n64rx::core::loader::{load_cart_rom, RomHeader};
//!
//! let mut image = vec![0u8; 0x1000];
//! image[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
//! image[0x20..0x24].copy_from_slice(b"TEST");
//! image[0x3B] = b'N';
//!
//! let rom = load_cart_rom(image).unwrap();
//! let header = RomHeader::parse(&rom).unwrap();
//! assert_eq!(header.title, "TEST");
//! assert!(!header.is_combo());
//! ```

use std::path::Path;

use super::error::{EmulatorError, Result};
use super::memory::layout::{MAX_DD_ROM_SIZE, MAX_ROM_SIZE};

/// Smallest image holding a complete header and IPL3
pub const MIN_ROM_SIZE: usize = 0x1000;

/// Offset of the media format byte in a big-endian cartridge image
pub const MEDIA_FORMAT_OFFSET: usize = 0x3B;

/// Media format tag of a cartridge that expects the disk drive alongside it
pub const MEDIA_COMBO: u8 = b'C';

/// Offset of the IPL3 boot code
pub const IPL3_OFFSET: usize = 0x40;

/// End of the IPL3 boot code
pub const IPL3_END: usize = 0x1000;

const Z64_MAGIC: u32 = 0x8037_1240;
const V64_MAGIC: u32 = 0x3780_4012;
const N64_MAGIC: u32 = 0x4012_3780;

const DD_IPL_MAGIC: u32 = 0x8027_0740;
const DD_IPL_MAGIC_LE: u32 = 0x4007_2780;

/// Byte order of a cartridge dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomFormat {
    /// Big-endian
    Z64,
    /// 16-bit byte-swapped
    V64,
    /// 32-bit little-endian
    N64,
}

impl RomFormat {
    /// Detect the byte order from the first word of an image
    pub fn detect(data: &[u8]) -> Result<Self> {
        let magic = first_word(data)?;
        match magic {
            Z64_MAGIC => Ok(RomFormat::Z64),
            V64_MAGIC => Ok(RomFormat::V64),
            N64_MAGIC => Ok(RomFormat::N64),
            _ => Err(EmulatorError::UnknownRomFormat { magic }),
        }
    }

    /// Convert an image in this byte order to big-endian in place
    pub fn normalize(self, data: &mut [u8]) {
        match self {
            RomFormat::Z64 => {}
            RomFormat::V64 => data.chunks_exact_mut(2).for_each(|half| half.swap(0, 1)),
            RomFormat::N64 => data.chunks_exact_mut(4).for_each(|word| word.reverse()),
        }
    }
}

/// Parsed cartridge header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Entry point the IPL3 jumps to
    pub entry_point: u32,
    /// Header checksums
    pub crc: [u32; 2],
    /// Image name
    pub title: String,
    /// Media format tag
    pub media_format: u8,
    /// Two-character cartridge ID
    pub cartridge_id: [u8; 2],
    /// Region code
    pub region: u8,
    /// Version
    pub version: u8,
}

impl RomHeader {
    /// Parse the header of a big-endian cartridge image
    pub fn parse(rom: &[u8]) -> Result<Self> {
        if rom.len() < MIN_ROM_SIZE {
            return Err(EmulatorError::InvalidRomSize {
                got: rom.len(),
                constraint: "at least 4 KiB",
            });
        }

        let word = |offset: usize| {
            u32::from_be_bytes([rom[offset], rom[offset + 1], rom[offset + 2], rom[offset + 3]])
        };

        let title = String::from_utf8_lossy(&rom[0x20..0x34])
            .trim_end_matches(['\0', ' '])
            .to_string();

        Ok(Self {
            entry_point: word(0x08),
            crc: [word(0x10), word(0x14)],
            title,
            media_format: rom[MEDIA_FORMAT_OFFSET],
            cartridge_id: [rom[0x3C], rom[0x3D]],
            region: rom[0x3E],
            version: rom[0x3F],
        })
    }

    /// Check whether the cartridge is a cartridge + disk combo
    pub fn is_combo(&self) -> bool {
        self.media_format == MEDIA_COMBO
    }
}

/// Validate a cartridge dump and normalize it to big-endian
///
/// # Returns
///
/// - `Ok(Vec<u8>)` with the big-endian image
/// - `Err(EmulatorError)` if the size does not fit the cartridge window or
///   the byte order is not recognized
pub fn load_cart_rom(mut data: Vec<u8>) -> Result<Vec<u8>> {
    if data.len() < MIN_ROM_SIZE || data.len() > MAX_ROM_SIZE || data.len() % 4 != 0 {
        return Err(EmulatorError::InvalidRomSize {
            got: data.len(),
            constraint: "a multiple of 4 between 4 KiB and 253 MiB",
        });
    }

    let format = RomFormat::detect(&data)?;
    format.normalize(&mut data);

    log::info!("Cartridge ROM: {} bytes ({:?})", data.len(), format);
    Ok(data)
}

/// Validate a disk drive IPL ROM dump and normalize it to big-endian
pub fn load_dd_rom(mut data: Vec<u8>) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > MAX_DD_ROM_SIZE || data.len() % 4 != 0 {
        return Err(EmulatorError::InvalidRomSize {
            got: data.len(),
            constraint: "a nonzero multiple of 4 up to 32 MiB",
        });
    }

    match first_word(&data)? {
        DD_IPL_MAGIC => {}
        DD_IPL_MAGIC_LE => RomFormat::N64.normalize(&mut data),
        magic => return Err(EmulatorError::UnknownRomFormat { magic }),
    }

    log::info!("Disk drive IPL ROM: {} bytes", data.len());
    Ok(data)
}

/// Read and load a cartridge ROM file
pub fn load_cart_rom_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    load_cart_rom(read_image(path.as_ref())?)
}

/// Read and load a disk drive IPL ROM file
pub fn load_dd_rom_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    load_dd_rom(read_image(path.as_ref())?)
}

/// Media format byte of a big-endian cartridge image, if present
pub fn media_format(rom: &[u8]) -> Option<u8> {
    rom.get(MEDIA_FORMAT_OFFSET).copied()
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EmulatorError::RomNotFound(path.display().to_string()),
        _ => EmulatorError::Io(e),
    })
}

fn first_word(data: &[u8]) -> Result<u32> {
    data.get(..4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(EmulatorError::InvalidRomSize {
            got: data.len(),
            constraint: "at least 4 bytes",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z64_image() -> Vec<u8> {
        let mut rom = vec![0u8; MIN_ROM_SIZE];
        rom[..4].copy_from_slice(&Z64_MAGIC.to_be_bytes());
        rom[0x08..0x0C].copy_from_slice(&0x8000_0400u32.to_be_bytes());
        rom[0x20..0x2A].copy_from_slice(b"SUPER GAME");
        rom[0x2A..0x34].fill(b' ');
        rom[0x3B] = b'C';
        rom[0x3C..0x3E].copy_from_slice(b"ZL");
        rom[0x3E] = b'E';
        rom[0x40] = 0xAB;
        rom
    }

    fn v64(rom: &[u8]) -> Vec<u8> {
        rom.chunks_exact(2).flat_map(|h| [h[1], h[0]]).collect()
    }

    fn n64(rom: &[u8]) -> Vec<u8> {
        rom.chunks_exact(4)
            .flat_map(|w| [w[3], w[2], w[1], w[0]])
            .collect()
    }

    #[test]
    fn test_detect_formats() {
        let rom = z64_image();
        assert_eq!(RomFormat::detect(&rom).unwrap(), RomFormat::Z64);
        assert_eq!(RomFormat::detect(&v64(&rom)).unwrap(), RomFormat::V64);
        assert_eq!(RomFormat::detect(&n64(&rom)).unwrap(), RomFormat::N64);
    }

    #[test]
    fn test_swapped_images_normalize_to_z64() {
        let rom = z64_image();

        assert_eq!(load_cart_rom(v64(&rom)).unwrap(), rom);
        assert_eq!(load_cart_rom(n64(&rom)).unwrap(), rom);
    }

    #[test]
    fn test_unknown_format() {
        let mut rom = z64_image();
        rom[0] = 0x12;

        match load_cart_rom(rom) {
            Err(EmulatorError::UnknownRomFormat { magic }) => assert_eq!(magic, 0x1237_1240),
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_size_limits() {
        assert!(matches!(
            load_cart_rom(vec![0x80, 0x37, 0x12, 0x40]),
            Err(EmulatorError::InvalidRomSize { got: 4, .. })
        ));

        let mut odd = z64_image();
        odd.push(0);
        assert!(matches!(
            load_cart_rom(odd),
            Err(EmulatorError::InvalidRomSize { .. })
        ));
    }

    #[test]
    fn test_header_parsing() {
        let header = RomHeader::parse(&z64_image()).unwrap();

        assert_eq!(header.entry_point, 0x8000_0400);
        assert_eq!(header.title, "SUPER GAME");
        assert_eq!(&header.cartridge_id, b"ZL");
        assert_eq!(header.region, b'E');
        assert!(header.is_combo());
    }

    #[test]
    fn test_media_format_byte() {
        assert_eq!(media_format(&z64_image()), Some(b'C'));
        assert_eq!(media_format(&[]), None);
    }

    #[test]
    fn test_dd_rom_byte_orders() {
        let mut ipl = vec![0u8; 0x1000];
        ipl[..4].copy_from_slice(&DD_IPL_MAGIC.to_be_bytes());
        ipl[4] = 0x11;

        assert_eq!(load_dd_rom(ipl.clone()).unwrap(), ipl);
        assert_eq!(load_dd_rom(n64(&ipl)).unwrap(), ipl);
        assert!(matches!(
            load_dd_rom(vec![0u8; 8]),
            Err(EmulatorError::UnknownRomFormat { magic: 0 })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_cart_rom_file(dir.path().join("missing.z64"));
        assert!(matches!(result, Err(EmulatorError::RomNotFound(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.v64");
        std::fs::write(&path, v64(&z64_image())).unwrap();

        assert_eq!(load_cart_rom_file(&path).unwrap(), z64_image());
    }
}
