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

//! Synthetic ROM images

/// 1 MiB cartridge
#[allow(dead_code)]
pub const CART_SIZE: usize = 0x10_0000;

/// Big-endian cartridge image whose bytes encode their own offset
#[allow(dead_code)]
pub fn cart_rom(size: usize) -> Vec<u8> {
    let mut rom: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    rom[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
    rom[0x20..0x34].copy_from_slice(b"N64RX               ");
    rom[0x3B] = b'N';
    rom
}

/// Cartridge image in 16-bit byte-swapped (v64) order
#[allow(dead_code)]
pub fn cart_rom_v64(size: usize) -> Vec<u8> {
    let mut rom = cart_rom(size);
    rom.chunks_exact_mut(2).for_each(|half| half.swap(0, 1));
    rom
}

/// Cartridge image tagged as a cartridge + disk combo
#[allow(dead_code)]
pub fn combo_rom(size: usize) -> Vec<u8> {
    let mut rom = cart_rom(size);
    rom[0x3B] = b'C';
    rom
}

/// Big-endian disk drive IPL ROM
#[allow(dead_code)]
pub fn dd_rom(size: usize) -> Vec<u8> {
    let mut rom = vec![0xDD; size];
    rom[..4].copy_from_slice(&[0x80, 0x27, 0x07, 0x40]);
    rom
}
