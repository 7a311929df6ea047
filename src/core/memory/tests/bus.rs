// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Bus dispatch tests
//!
//! Tests for region lookup, slot priority and open-bus behavior.

use proptest::prelude::*;

use super::helpers::*;
use super::*;

#[test]
fn test_region_identification() {
    let bus = create_test_bus();

    assert_eq!(bus.kind_at(0x0000_0000), RegionKind::Rdram);
    assert_eq!(bus.kind_at(0x03EF_FFFC), RegionKind::Rdram);
    assert_eq!(bus.kind_at(0x03F0_0000), RegionKind::RdramRegs);
    assert_eq!(bus.kind_at(0x0400_0000), RegionKind::SpMem);
    assert_eq!(bus.kind_at(0x0404_0010), RegionKind::SpRegs);
    assert_eq!(bus.kind_at(0x0408_0000), RegionKind::SpRegs2);
    assert_eq!(bus.kind_at(0x0410_000C), RegionKind::DpRegs);
    assert_eq!(bus.kind_at(0x0420_0000), RegionKind::DpsRegs);
    assert_eq!(bus.kind_at(0x0430_0008), RegionKind::Mi);
    assert_eq!(bus.kind_at(0x0440_0000), RegionKind::Vi);
    assert_eq!(bus.kind_at(0x0450_0000), RegionKind::Ai);
    assert_eq!(bus.kind_at(0x0460_0010), RegionKind::Pi);
    assert_eq!(bus.kind_at(0x0470_0000), RegionKind::Ri);
    assert_eq!(bus.kind_at(0x0480_0018), RegionKind::Si);
    assert_eq!(bus.kind_at(0x0800_0000), RegionKind::FlashramStatus);
    assert_eq!(bus.kind_at(0x1000_0000), RegionKind::CartRom);
    assert_eq!(bus.kind_at(0x107F_FFFC), RegionKind::CartRom);
    assert_eq!(bus.kind_at(0x13FF_0000), RegionKind::DebugViewer);
    assert_eq!(bus.kind_at(0x1FC0_07C0), RegionKind::Pif);
}

#[test]
fn test_gaps_are_open_bus() {
    let bus = create_test_bus();

    // between SP regs2 and DPC
    assert_eq!(bus.kind_at(0x040C_0000), RegionKind::Nothing);
    // past the end of an 8 MiB cartridge
    assert_eq!(bus.kind_at(0x1080_0000), RegionKind::Nothing);
    // disk drive windows without a disk drive
    assert_eq!(bus.kind_at(0x0500_0000), RegionKind::Nothing);
    assert_eq!(bus.kind_at(0x0600_0000), RegionKind::Nothing);
    // above the PIF
    assert_eq!(bus.kind_at(0x2000_0000), RegionKind::Nothing);
    assert_eq!(bus.kind_at(0xFFFF_FFFC), RegionKind::Nothing);
}

#[test]
fn test_partial_page_falls_back_exactly() {
    // the debug viewer only covers the first 4 KiB of its page
    let bus = create_test_bus();

    assert_eq!(bus.kind_at(0x13FF_0FFC), RegionKind::DebugViewer);
    assert_eq!(bus.kind_at(0x13FF_1000), RegionKind::Nothing);
}

#[test]
fn test_non_power_of_two_rom_ends_exactly() {
    let bus = Bus::new(build_mappings(&MappingConfig {
        rom_size: 0x12_3400,
        ..cart_only()
    }));

    assert_eq!(bus.kind_at(0x1012_33FC), RegionKind::CartRom);
    assert_eq!(bus.kind_at(0x1012_3400), RegionKind::Nothing);
}

#[test]
fn test_disk_drive_regions_routed_when_present() {
    let bus = Bus::new(build_mappings(&with_disk_drive()));

    assert_eq!(bus.kind_at(0x0500_0508), RegionKind::DdRegs);
    assert_eq!(bus.kind_at(0x0600_0000), RegionKind::DdRom);
    assert_eq!(bus.kind_at(0x063F_FFFC), RegionKind::DdRom);
    assert_eq!(bus.kind_at(0x0640_0000), RegionKind::Nothing);
}

#[test]
fn test_read_dispatches_with_full_address() {
    let bus = create_test_bus();
    let mut handlers = RecordingHandlers::default();

    let value = bus.read(&mut handlers, 0x0430_0004);

    assert_eq!(handlers.reads, vec![(RegionKind::Mi, 0x0430_0004)]);
    assert_eq!(value, ((RegionKind::Mi as u32) << 24) | 0x30_0004);
}

#[test]
fn test_write_dispatches_value_and_mask() {
    let bus = create_test_bus();
    let mut handlers = RecordingHandlers::default();

    bus.write(&mut handlers, 0x0000_0100, 0x00AB_0000, 0x00FF_0000);

    assert_eq!(
        handlers.writes,
        vec![(RegionKind::Rdram, 0x0000_0100, 0x00AB_0000, 0x00FF_0000)]
    );
}

#[test]
fn test_open_bus_never_reaches_handlers() {
    let bus = create_test_bus();
    let mut handlers = RecordingHandlers::default();

    assert_eq!(bus.read(&mut handlers, 0x0500_1234), 0x1234_1234);
    bus.write(&mut handlers, 0x0500_1234, 0xFFFF_FFFF, 0xFFFF_FFFF);

    assert!(handlers.reads.is_empty());
    assert!(handlers.writes.is_empty());
}

#[test]
fn test_address_translation() {
    assert_eq!(translate_address(0x8000_1000), 0x0000_1000);
    assert_eq!(translate_address(0xA000_1000), 0x0000_1000);
    assert_eq!(translate_address(0xBFC0_0000), 0x1FC0_0000);
    assert_eq!(translate_address(0x0000_1000), 0x0000_1000);
    // KSSEG is left to the execution core
    assert_eq!(translate_address(0xC000_0000), 0xC000_0000);
}

#[test]
fn test_masked_write_merges_lanes() {
    let mut word = 0x1122_3344;
    masked_write(&mut word, 0xAABB_CCDD, 0xFF00_00FF);
    assert_eq!(word, 0xAA22_33DD);
}

#[test]
fn test_be_word_helpers_bounds() {
    let mut buf = [0u8; 6];
    write_be_word(&mut buf, 0, 0x0102_0304, 0xFFFF_FFFF);
    write_be_word(&mut buf, 4, 0xFFFF_FFFF, 0xFFFF_FFFF);

    assert_eq!(read_be_word(&buf, 0), Some(0x0102_0304));
    assert_eq!(read_be_word(&buf, 4), None);
    assert_eq!(&buf[4..], &[0, 0]);
}

fn unclaimed(address: u32) -> bool {
    build_mappings(&cart_only())
        .iter()
        .skip(1)
        .filter(|m| m.kind != RegionKind::Nothing)
        .all(|m| !m.contains(address))
}

proptest! {
    #[test]
    fn prop_unclaimed_addresses_read_open_bus(address in any::<u32>()) {
        prop_assume!(unclaimed(address));
        let bus = create_test_bus();
        let mut handlers = RecordingHandlers::default();

        let low = address & 0xFFFF;
        prop_assert_eq!(bus.read(&mut handlers, address), low | (low << 16));
        bus.write(&mut handlers, address, 0xDEAD_BEEF, 0xFFFF_FFFF);
        prop_assert!(handlers.reads.is_empty());
        prop_assert!(handlers.writes.is_empty());
    }

    #[test]
    fn prop_lookup_matches_linear_scan(address in any::<u32>()) {
        let bus = create_test_bus();
        let expected = bus
            .mappings()
            .iter()
            .rev()
            .find(|m| m.contains(address))
            .map(|m| m.kind)
            .unwrap_or(RegionKind::Nothing);

        prop_assert_eq!(bus.kind_at(address), expected);
    }
}
