// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Helper functions for device tests

use super::*;
use crate::core::config::{SaveType, DRAM_SIZE_4M};

/// 64 KiB cartridge
pub const ROM_SIZE: usize = 0x1_0000;

/// 4 MiB disk drive IPL ROM
pub const DD_ROM_SIZE: usize = 0x40_0000;

/// Cartridge image whose bytes encode their own offset
pub fn test_rom(size: usize) -> Vec<u8> {
    let mut rom: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    rom[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
    rom
}

/// Cartridge declaring the combo media format
pub fn combo_rom(size: usize) -> Vec<u8> {
    let mut rom = test_rom(size);
    rom[0x3B] = b'C';
    rom
}

/// Disk drive IPL ROM filled with a marker byte
pub fn dd_rom() -> Vec<u8> {
    vec![0xDD; DD_ROM_SIZE]
}

/// Small machine configuration
pub fn test_config() -> MachineConfig {
    MachineConfig {
        dram_size: DRAM_SIZE_4M,
        ..MachineConfig::default()
    }
}

pub fn config_with_save(save_type: SaveType) -> MachineConfig {
    MachineConfig {
        save_type,
        ..test_config()
    }
}

/// Cartridge-only machine with default backends
pub fn cart_device() -> Device {
    Device::compose(
        &test_config(),
        Media::cartridge(test_rom(ROM_SIZE)),
        Backends::default(),
    )
}

/// Machine with a disk drive next to a plain cartridge
pub fn dd_device(backends: Backends) -> Device {
    let media = Media {
        rom: test_rom(ROM_SIZE),
        dd_rom: dd_rom(),
    };
    Device::compose(&test_config(), media, backends)
}

/// Cartridge-only machine, powered on
pub fn powered_cart_device() -> Device {
    let mut device = cart_device();
    device.poweron();
    device
}

/// Physical word read through the bus
pub fn bus_read(device: &mut Device, address: u32) -> u32 {
    device.bus.read(&mut device.hw, address)
}

/// Physical full-word write through the bus
pub fn bus_write(device: &mut Device, address: u32, value: u32) {
    device.bus.write(&mut device.hw, address, value, 0xFFFF_FFFF);
}

/// Advance virtual time by `cycles` and take a checkpoint
pub fn advance_and_checkpoint(hw: &mut Hardware, cycles: u64) {
    let per_op = hw.r4300.count_per_op() as u64;
    hw.r4300.advance((cycles / per_op) as u32);
    r4300::checkpoint(hw);
}

/// Queued events of one kind, with their due times
pub fn queued(hw: &Hardware, kind: InterruptKind) -> Vec<u64> {
    hw.r4300
        .events
        .iter()
        .filter(|event| event.kind == kind)
        .map(|event| event.time)
        .collect()
}

