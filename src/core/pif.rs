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

//! Peripheral Interface controller (PIF)
//!
//! Boot ROM, 64 bytes of scratch RAM and the joybus that talks to the
//! devices in the controller ports.
//!
//! ## Joybus Command Block
//!
//! When the CPU (through the SI) sets bit 0 of the last RAM byte, the RAM is
//! parsed as a list of per-channel commands:
//!
//! ```text
//! 0x00          skip to the next channel
//! 0xFF, 0xFD    padding
//! 0xFE          end of commands
//! tx rx data..  command of `tx` bytes expecting `rx` bytes of answer
//! ```
//!
//! A channel that does not answer gets bit 7 set in its `rx` byte.
//!
//! ## Boot
//!
//! The boot ROM contents are not shipped; booting is high-level: the IPL3
//! stage of the boot medium is copied to SP DMEM and execution starts there.

use crate::core::backend::{JoybusDevice, PERIPHERAL_PORTS};
use crate::core::loader::{IPL3_END, IPL3_OFFSET};
use crate::core::memory::layout::{PIF_RAM_SIZE, PIF_ROM_SIZE};
use crate::core::memory::{read_be_word, write_be_word};
use crate::core::r4300::R4300;
use crate::core::rdram::Rdram;

/// Entry point of the IPL3 stage in SP DMEM
pub const IPL3_ENTRY: u32 = 0xA400_0040;

const PIF_COMMAND_BYTE: usize = PIF_RAM_SIZE - 1;
const PIF_CMD_PROCESS: u8 = 0x01;

const JOYBUS_SKIP_CHANNEL: u8 = 0x00;
const JOYBUS_END: u8 = 0xFE;
const JOYBUS_PAD: u8 = 0xFF;
const JOYBUS_RESET_PAD: u8 = 0xFD;
const JOYBUS_NO_RESPONSE: u8 = 0x80;

/// Devices in the controller ports
pub type JoybusChannels = [Option<Box<dyn JoybusDevice>>; PERIPHERAL_PORTS];

/// PIF boot ROM, scratch RAM and joybus
pub struct Pif {
    rom: Box<[u8]>,
    ram: [u8; PIF_RAM_SIZE],
    channels: JoybusChannels,
}

impl Pif {
    pub fn new(channels: JoybusChannels) -> Self {
        Self {
            rom: vec![0u8; PIF_ROM_SIZE].into_boxed_slice(),
            ram: [0; PIF_RAM_SIZE],
            channels,
        }
    }

    /// Clear the scratch RAM and power on every plugged device
    pub fn poweron(&mut self) {
        self.ram.fill(0);
        for device in self.channels.iter_mut().flatten() {
            device.poweron();
        }
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    /// Number of plugged devices
    pub fn plugged(&self) -> usize {
        self.channels.iter().flatten().count()
    }

    /// Read a word of PIF ROM or RAM
    pub fn read(&self, address: u32) -> u32 {
        let offset = (address & 0x7FC) as usize;
        if offset < PIF_ROM_SIZE {
            read_be_word(&self.rom, offset).unwrap_or(0)
        } else {
            read_be_word(&self.ram, offset - PIF_ROM_SIZE).unwrap_or(0)
        }
    }

    /// Write a word of PIF RAM; the ROM ignores writes
    pub fn write(&mut self, address: u32, value: u32, mask: u32) {
        let offset = (address & 0x7FC) as usize;
        if offset < PIF_ROM_SIZE {
            log::trace!("PIF: write to boot ROM at 0x{:03X} ignored", offset);
            return;
        }
        write_be_word(&mut self.ram, offset - PIF_ROM_SIZE, value, mask);
    }

    /// SI transfer RDRAM to PIF RAM, then run the joybus commands
    pub fn dma_from_dram(&mut self, rdram: &Rdram, dram_address: u32) {
        rdram.copy_out(dram_address as usize, &mut self.ram);
        self.process_commands();
    }

    /// SI transfer PIF RAM to RDRAM
    pub fn dma_to_dram(&self, rdram: &mut Rdram, dram_address: u32) {
        rdram.copy_in(dram_address as usize, &self.ram);
    }

    /// Run the joybus command block held in RAM
    pub fn process_commands(&mut self) {
        if self.ram[PIF_COMMAND_BYTE] & PIF_CMD_PROCESS == 0 {
            return;
        }

        let mut channel = 0;
        let mut i = 0;
        while i < PIF_COMMAND_BYTE {
            match self.ram[i] {
                JOYBUS_SKIP_CHANNEL => {
                    channel += 1;
                    i += 1;
                }
                JOYBUS_PAD | JOYBUS_RESET_PAD => i += 1,
                JOYBUS_END => break,
                byte => {
                    let tx = (byte & 0x3F) as usize;
                    let rx = (self.ram[i + 1] & 0x3F) as usize;
                    let tx_start = i + 2;
                    let rx_start = tx_start + tx;
                    if rx_start + rx > PIF_COMMAND_BYTE {
                        log::warn!("PIF: command at 0x{:02X} overruns RAM", i);
                        break;
                    }

                    let answered = match self.channels.get_mut(channel) {
                        Some(Some(device)) => {
                            let (head, tail) = self.ram.split_at_mut(rx_start);
                            device.process(&head[tx_start..], &mut tail[..rx])
                        }
                        _ => false,
                    };
                    if !answered {
                        self.ram[i + 1] |= JOYBUS_NO_RESPONSE;
                    }

                    i = rx_start + rx;
                    channel += 1;
                }
            }
        }

        self.ram[PIF_COMMAND_BYTE] &= !PIF_CMD_PROCESS;
    }
}

/// High-level boot: run the IPL3 stage of `boot_rom` from SP DMEM
///
/// Copies `boot_rom[0x40..0x1000]` to the same offsets of SP memory and
/// points the CPU at it.
pub fn hle_boot(boot_rom: &[u8], sp_mem: &mut [u8], r4300: &mut R4300) {
    let end = IPL3_END.min(boot_rom.len()).min(sp_mem.len());
    if end > IPL3_OFFSET {
        sp_mem[IPL3_OFFSET..end].copy_from_slice(&boot_rom[IPL3_OFFSET..end]);
    } else {
        log::warn!("Boot image too small for IPL3 ({} bytes)", boot_rom.len());
    }
    r4300.set_pc(IPL3_ENTRY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const PIF_RAM_ADDR: u32 = 0x1FC0_07C0;

    /// Answers status requests (0x00) with a fixed id
    struct MockPad {
        powerons: Rc<Cell<usize>>,
    }

    impl JoybusDevice for MockPad {
        fn poweron(&mut self) {
            self.powerons.set(self.powerons.get() + 1);
        }

        fn process(&mut self, tx: &[u8], rx: &mut [u8]) -> bool {
            if tx.first() != Some(&0x00) {
                return false;
            }
            rx.copy_from_slice(&[0x05, 0x00, 0x02][..rx.len()]);
            true
        }
    }

    fn pif_with_pad() -> (Pif, Rc<Cell<usize>>) {
        let powerons = Rc::new(Cell::new(0));
        let pad: Box<dyn JoybusDevice> = Box::new(MockPad {
            powerons: Rc::clone(&powerons),
        });
        (Pif::new([Some(pad), None, None, None]), powerons)
    }

    #[test]
    fn test_rom_ram_split() {
        let (mut pif, _) = pif_with_pad();

        pif.write(0x1FC0_0000, 0xFFFF_FFFF, 0xFFFF_FFFF);
        pif.write(PIF_RAM_ADDR + 4, 0x1234_5678, 0xFFFF_FFFF);

        assert_eq!(pif.read(0x1FC0_0000), 0);
        assert_eq!(pif.read(PIF_RAM_ADDR + 4), 0x1234_5678);
        assert_eq!(&pif.ram()[4..8], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_poweron_reaches_devices() {
        let (mut pif, powerons) = pif_with_pad();
        pif.ram_mut()[0] = 0xAA;

        pif.poweron();

        assert_eq!(powerons.get(), 1);
        assert_eq!(pif.ram()[0], 0);
        assert_eq!(pif.plugged(), 1);
    }

    #[test]
    fn test_status_command_answered() {
        let (mut pif, _) = pif_with_pad();
        let block = [0x01, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFE];
        pif.ram_mut()[..block.len()].copy_from_slice(&block);
        pif.ram_mut()[PIF_COMMAND_BYTE] = PIF_CMD_PROCESS;

        pif.process_commands();

        assert_eq!(&pif.ram()[..6], &[0x01, 0x03, 0x00, 0x05, 0x00, 0x02]);
        assert_eq!(pif.ram()[PIF_COMMAND_BYTE], 0);
    }

    #[test]
    fn test_empty_channel_flags_no_response() {
        let (mut pif, _) = pif_with_pad();
        // skip channel 0, query channel 1 (empty)
        let block = [0x00, 0x01, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFE];
        pif.ram_mut()[..block.len()].copy_from_slice(&block);
        pif.ram_mut()[PIF_COMMAND_BYTE] = PIF_CMD_PROCESS;

        pif.process_commands();

        assert_eq!(pif.ram()[2], 0x03 | JOYBUS_NO_RESPONSE);
        assert_eq!(&pif.ram()[4..7], &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_commands_need_process_bit() {
        let (mut pif, _) = pif_with_pad();
        let block = [0x01, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFE];
        pif.ram_mut()[..block.len()].copy_from_slice(&block);

        pif.process_commands();

        assert_eq!(pif.ram()[3], 0xFF);
    }

    #[test]
    fn test_si_transfers() {
        let (mut pif, _) = pif_with_pad();
        let mut rdram = Rdram::new(0x1000);
        rdram.copy_in(0x200, &[0x01, 0x03, 0x00, 0xFF, 0xFF, 0xFF, 0xFE]);
        rdram.dram_mut()[0x200 + PIF_COMMAND_BYTE] = PIF_CMD_PROCESS;

        pif.dma_from_dram(&rdram, 0x200);
        pif.dma_to_dram(&mut rdram, 0x400);

        assert_eq!(&rdram.dram()[0x403..0x406], &[0x05, 0x00, 0x02]);
    }

    #[test]
    fn test_hle_boot() {
        let mut rom = vec![0u8; 0x1000];
        rom[0x40..0x44].copy_from_slice(&[0x3C, 0x08, 0xA4, 0x00]);
        rom[0xFFC] = 0x77;
        let mut sp_mem = vec![0u8; 0x2000];
        let mut r4300 = R4300::new(2);

        hle_boot(&rom, &mut sp_mem, &mut r4300);

        assert_eq!(&sp_mem[0x40..0x44], &[0x3C, 0x08, 0xA4, 0x00]);
        assert_eq!(sp_mem[0xFFC], 0x77);
        assert_eq!(sp_mem[0x1000], 0);
        assert_eq!(r4300.pc(), IPL3_ENTRY);
    }
}
