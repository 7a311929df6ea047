// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Host memory map export tests

use super::helpers::*;
use super::*;
use crate::core::config::SaveType;

fn export(config: MappingConfig, save_type: SaveType) -> HostMemoryMap {
    build_host_map(&build_mappings(&config), save_type)
}

#[test]
fn test_rdram_exported_through_both_segments() {
    let map = export(cart_only(), SaveType::Auto);
    let rdram: Vec<_> = map.iter().filter(|d| d.backing == Backing::Rdram).collect();

    assert_eq!(rdram.len(), 2);

    assert_eq!(rdram[0].start, 0x8000_0000);
    assert_eq!(rdram[0].select, 0x2000_0000);
    assert_eq!(rdram[0].disconnect, 0xC000_0000);

    assert_eq!(rdram[1].start, 0xA000_0000);
    assert_eq!(rdram[1].select, 0);
    assert_eq!(rdram[1].disconnect, 0);

    for d in rdram {
        assert_eq!(d.len, DRAM_4M);
        assert_eq!(d.flags, MemDescFlags::SYSTEM_RAM);
    }
}

#[test]
fn test_save_media_follows_save_type() {
    let cases = [
        (SaveType::Sram, Backing::Sram, layout::SRAM_SIZE),
        (SaveType::Auto, Backing::FlashRam, layout::FLASHRAM_SIZE),
        (SaveType::FlashRam, Backing::FlashRam, layout::FLASHRAM_SIZE),
    ];

    for (save_type, backing, len) in cases {
        let map = export(cart_only(), save_type);
        let save: Vec<_> = map
            .iter()
            .filter(|d| matches!(d.backing, Backing::Sram | Backing::FlashRam))
            .collect();

        assert_eq!(save.len(), 1, "{:?}", save_type);
        assert_eq!(save[0].backing, backing);
        assert_eq!(save[0].start, 0xA800_0000);
        assert_eq!(save[0].len, len);
        assert_eq!(save[0].flags, MemDescFlags::empty());
    }
}

#[test]
fn test_pif_split_into_rom_and_ram() {
    let map = export(cart_only(), SaveType::Auto);

    let rom = map.iter().find(|d| d.backing == Backing::PifRom).unwrap();
    let ram = map.iter().find(|d| d.backing == Backing::PifRam).unwrap();

    assert_eq!(rom.start, 0xBFC0_0000);
    assert_eq!(rom.len, 0x7C0);
    assert_eq!(rom.flags, MemDescFlags::CONST);

    assert_eq!(ram.start, 0xBFC0_07C0);
    assert_eq!(ram.len, 0x40);
    assert!(!ram.flags.contains(MemDescFlags::CONST));
}

#[test]
fn test_no_disk_drive_backing_without_disk_drive() {
    let map = export(cart_only(), SaveType::Auto);

    assert!(map
        .iter()
        .all(|d| !matches!(d.backing, Backing::DdRegs | Backing::DdRom)));
}

#[test]
fn test_disk_drive_exported_when_present() {
    let map = export(with_disk_drive(), SaveType::Auto);

    let rom = map.iter().find(|d| d.backing == Backing::DdRom).unwrap();
    assert_eq!(rom.start, 0xA600_0000);
    assert_eq!(rom.len, 0x40_0000);
    assert!(map.iter().any(|d| d.backing == Backing::DdRegs));
}

#[test]
fn test_registers_exported_uncached() {
    let map = export(cart_only(), SaveType::Auto);

    let mi = map.iter().find(|d| d.backing == Backing::MiRegs).unwrap();
    assert_eq!(mi.start, 0xA430_0000);
    assert_eq!(mi.len, layout::MI_REGS_COUNT * 4);

    let cart = map.iter().find(|d| d.backing == Backing::CartRom).unwrap();
    assert_eq!(cart.start, 0xB000_0000);
    assert_eq!(cart.len, ROM_8M);
}

#[test]
fn test_map_fits_capacity() {
    let map = export(with_disk_drive(), SaveType::FlashRam);

    // 18 exported slots, plus the KSEG0 alias and the PIF RAM half
    assert!(map.len() <= HOST_MAP_CAPACITY);
    assert_eq!(map.len(), 20);
}

#[test]
fn test_descriptors_serialize() {
    let map = export(cart_only(), SaveType::Sram);
    let json = serde_json::to_string(map.as_slice()).unwrap();

    assert!(json.contains("\"backing\":\"Rdram\""));
    assert!(json.contains("\"start\":2147483648"));
}
