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

//! Disk drive controller
//!
//! Optional expansion unit attached under the cartridge. It answers two
//! windows:
//!
//! - DOM2 addr1 (0x05000000): sector buffers and the ASIC registers
//! - DOM1 addr1 (0x06000000): the drive's IPL ROM
//!
//! ## ASIC Registers (0x05000500)
//!
//! ```text
//! 0x500 ASIC_DATA          command argument / result (upper half)
//! 0x504 ASIC_MISC_REG
//! 0x508 ASIC_CMD_STATUS    write: command, read: status
//! 0x50C ASIC_CUR_TK        current track
//! 0x510 ASIC_BM_STATUS_CTL write: buffer manager control, read: BM status
//! ...
//! 0x540 ASIC_ID_REG
//! ```
//!
//! Every command completes after a short delay with a MECHA interrupt; a
//! buffer manager start completes with a BM interrupt. Either interrupt
//! drives CP0 IP3 until acknowledged. Disk sector encoding is not modelled.

use chrono::{Datelike, Timelike};

use crate::core::backend::{ClockBackend, StorageBackend};
use crate::core::memory::layout::{DD_ASIC_REGS_COUNT, DD_ROM};
use crate::core::memory::{masked_write, read_be_word, write_be_word};
use crate::core::r4300::{Cp0, InterruptKind, R4300, CAUSE_IP3};
use crate::core::rdram::Rdram;

pub const ASIC_DATA: usize = 0;
pub const ASIC_MISC_REG: usize = 1;
pub const ASIC_CMD_STATUS: usize = 2;
pub const ASIC_CUR_TK: usize = 3;
pub const ASIC_BM_STATUS_CTL: usize = 4;
pub const ASIC_ERR_SECTOR: usize = 5;
pub const ASIC_SEQ_STATUS_CTL: usize = 6;
pub const ASIC_CUR_SECTOR: usize = 7;
pub const ASIC_HARD_RESET: usize = 8;
pub const ASIC_C1_S0: usize = 9;
pub const ASIC_HOST_SECBYTE: usize = 10;
pub const ASIC_C1_S2: usize = 11;
pub const ASIC_SEC_BYTE: usize = 12;
pub const ASIC_C1_S4: usize = 13;
pub const ASIC_C1_S6: usize = 14;
pub const ASIC_CUR_ADDR: usize = 15;
pub const ASIC_ID_REG: usize = 16;
pub const ASIC_TEST_REG: usize = 17;
pub const ASIC_TEST_PIN_SEL: usize = 18;

pub const DD_STATUS_DATA_RQ: u32 = 0x4000_0000;
pub const DD_STATUS_C2_XFER: u32 = 0x1000_0000;
pub const DD_STATUS_BM_ERR: u32 = 0x0800_0000;
pub const DD_STATUS_BM_INT: u32 = 0x0400_0000;
pub const DD_STATUS_MECHA_INT: u32 = 0x0200_0000;
pub const DD_STATUS_DISK_PRES: u32 = 0x0100_0000;
pub const DD_STATUS_BUSY_STATE: u32 = 0x0080_0000;
pub const DD_STATUS_RST_STATE: u32 = 0x0040_0000;
pub const DD_STATUS_MTR_N_SPIN: u32 = 0x0010_0000;
pub const DD_STATUS_HEAD_RTRCT: u32 = 0x0008_0000;
pub const DD_STATUS_DISK_CHNG: u32 = 0x0001_0000;

const BM_CTL_START: u32 = 0x8000_0000;
const BM_CTL_RESET: u32 = 0x1000_0000;
const BM_CTL_MECHA_RST: u32 = 0x0100_0000;

const DD_CMD_SEEK_READ: u32 = 0x01;
const DD_CMD_SEEK_WRITE: u32 = 0x02;
const DD_CMD_RECALIBRATE: u32 = 0x03;
const DD_CMD_CLR_DSK_CHNG: u32 = 0x08;
const DD_CMD_CLR_RESET: u32 = 0x09;
const DD_CMD_READ_VERSION: u32 = 0x0A;
const DD_CMD_GET_RTC_YEAR_MONTH: u32 = 0x12;
const DD_CMD_GET_RTC_DAY_HOUR: u32 = 0x13;
const DD_CMD_GET_RTC_MINUTE_SECOND: u32 = 0x15;
const DD_CMD_FEATURE_INQ: u32 = 0x1B;

/// ASIC version reported by READ_VERSION (retail drive)
const DD_ASIC_VERSION: u32 = 0x0114;

/// ASIC id reported by ASIC_ID_REG (retail drive)
const DD_ASIC_ID: u32 = 0x0003_0000;

/// Cycles a drive command takes before its MECHA interrupt
pub const DD_MECHA_DELAY: u64 = 10_000;

/// Cycles a buffer manager block takes before its BM interrupt
pub const DD_BM_DELAY: u64 = 20_000;

/// Cycles after power-on at which an inserted disk is reported
pub const DD_DV_DELAY: u64 = 1_000;

const C2S_BUFFER: usize = 0x000;
const C2S_BUFFER_SIZE: usize = 0x400;
const DS_BUFFER: usize = 0x400;
const DS_BUFFER_SIZE: usize = 0x100;
const ASIC_REGS: usize = 0x500;

/// Encode a value below 100 as BCD
fn bcd(value: u32) -> u32 {
    ((value / 10) << 4) | (value % 10)
}

/// Disk drive controller
pub struct DdController {
    rom: Vec<u8>,
    regs: [u32; DD_ASIC_REGS_COUNT],
    c2s_buf: [u8; C2S_BUFFER_SIZE],
    ds_buf: [u8; DS_BUFFER_SIZE],
    clock: Box<dyn ClockBackend>,
    disk: Option<Box<dyn StorageBackend>>,
}

impl DdController {
    pub fn new(
        rom: Vec<u8>,
        clock: Box<dyn ClockBackend>,
        disk: Option<Box<dyn StorageBackend>>,
    ) -> Self {
        Self {
            rom,
            regs: [0; DD_ASIC_REGS_COUNT],
            c2s_buf: [0; C2S_BUFFER_SIZE],
            ds_buf: [0; DS_BUFFER_SIZE],
            clock,
            disk,
        }
    }

    /// Reset the ASIC and report the inserted disk shortly after
    pub fn poweron(&mut self, r4300: &mut R4300) {
        self.regs = [0; DD_ASIC_REGS_COUNT];
        self.c2s_buf.fill(0);
        self.ds_buf.fill(0);
        self.regs[ASIC_ID_REG] = DD_ASIC_ID;
        self.regs[ASIC_CMD_STATUS] = DD_STATUS_RST_STATE;

        if self.disk.is_some() {
            r4300.schedule(InterruptKind::DdDv, DD_DV_DELAY);
        }
        log::info!(
            "Disk drive powered on ({})",
            if self.disk.is_some() { "disk inserted" } else { "no disk" }
        );
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn status(&self) -> u32 {
        self.regs[ASIC_CMD_STATUS]
    }

    pub fn has_disk(&self) -> bool {
        self.disk.is_some()
    }

    /// Byte view of the ASIC registers (host byte order)
    pub fn asic_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.regs)
    }

    /// Read the DOM2 addr1 window (buffers and ASIC registers)
    pub fn read_regs(&mut self, address: u32) -> u32 {
        let offset = (address & 0x7FC) as usize;
        match offset {
            o if o < DS_BUFFER => read_be_word(&self.c2s_buf, o - C2S_BUFFER).unwrap_or(0),
            o if o < ASIC_REGS => read_be_word(&self.ds_buf, o - DS_BUFFER).unwrap_or(0),
            o => self.regs.get((o - ASIC_REGS) >> 2).copied().unwrap_or(0),
        }
    }

    /// Write the DOM2 addr1 window
    pub fn write_regs(&mut self, address: u32, value: u32, mask: u32, r4300: &mut R4300) {
        let offset = (address & 0x7FC) as usize;
        if offset < DS_BUFFER {
            write_be_word(&mut self.c2s_buf, offset - C2S_BUFFER, value, mask);
            return;
        }
        if offset < ASIC_REGS {
            write_be_word(&mut self.ds_buf, offset - DS_BUFFER, value, mask);
            return;
        }

        let value = value & mask;
        match (offset - ASIC_REGS) >> 2 {
            ASIC_DATA => masked_write(&mut self.regs[ASIC_DATA], value, mask),
            ASIC_CMD_STATUS => self.command(value >> 16, r4300),
            ASIC_BM_STATUS_CTL => self.bm_control(value, r4300),
            ASIC_HARD_RESET => {
                log::debug!("DD: ASIC hard reset");
                self.regs[ASIC_CMD_STATUS] |= DD_STATUS_RST_STATE;
            }
            reg if reg < DD_ASIC_REGS_COUNT => masked_write(&mut self.regs[reg], value, mask),
            reg => log::trace!("DD: write to unknown ASIC register {} ignored", reg),
        }
    }

    /// Read the drive IPL ROM
    pub fn read_rom(&self, address: u32) -> u32 {
        read_be_word(&self.rom, ((address - DD_ROM) & !3) as usize).unwrap_or(0)
    }

    /// PI transfer from the drive to RDRAM
    pub fn dma_to_dram(
        &self,
        cart_address: u32,
        rdram: &mut Rdram,
        dram_address: u32,
        length: u32,
    ) {
        let src: &[u8] = if cart_address >= DD_ROM {
            self.rom.get((cart_address - DD_ROM) as usize..).unwrap_or(&[])
        } else {
            let offset = (cart_address & 0x7FF) as usize;
            match offset {
                o if o < DS_BUFFER => &self.c2s_buf[o..],
                o if o < ASIC_REGS => &self.ds_buf[o - DS_BUFFER..],
                _ => &[],
            }
        };
        let len = src.len().min(length as usize);
        rdram.copy_in(dram_address as usize, &src[..len]);
    }

    /// PI transfer from RDRAM into the sector buffers
    pub fn dma_from_dram(
        &mut self,
        cart_address: u32,
        rdram: &Rdram,
        dram_address: u32,
        length: u32,
    ) {
        let offset = (cart_address & 0x7FF) as usize;
        let dst: &mut [u8] = match offset {
            o if cart_address < DD_ROM && o < DS_BUFFER => &mut self.c2s_buf[o..],
            o if cart_address < DD_ROM && o < ASIC_REGS => &mut self.ds_buf[o - DS_BUFFER..],
            _ => {
                log::warn!("DD: write DMA to 0x{:08X} ignored", cart_address);
                return;
            }
        };
        let len = dst.len().min(length as usize);
        rdram.copy_out(dram_address as usize, &mut dst[..len]);
    }

    /// Command completion: MECHA interrupt
    pub fn mecha_interrupt(&mut self, cp0: &mut Cp0) {
        self.regs[ASIC_CMD_STATUS] &= !DD_STATUS_BUSY_STATE;
        self.regs[ASIC_CMD_STATUS] |= DD_STATUS_MECHA_INT;
        self.update_interrupt_line(cp0);
    }

    /// Buffer manager block completion: BM interrupt with data request
    pub fn bm_interrupt(&mut self, cp0: &mut Cp0) {
        self.regs[ASIC_CMD_STATUS] |= DD_STATUS_BM_INT | DD_STATUS_DATA_RQ;
        self.update_interrupt_line(cp0);
    }

    /// Disk detection: report the inserted disk as present and changed
    pub fn disk_interrupt(&mut self, cp0: &mut Cp0) {
        if self.disk.is_some() {
            self.regs[ASIC_CMD_STATUS] |= DD_STATUS_DISK_PRES | DD_STATUS_DISK_CHNG;
            self.regs[ASIC_CMD_STATUS] |= DD_STATUS_MECHA_INT;
        }
        self.update_interrupt_line(cp0);
    }

    fn command(&mut self, cmd: u32, r4300: &mut R4300) {
        log::debug!("DD: command 0x{:02X}", cmd);
        let now = self.clock.now();

        match cmd {
            DD_CMD_SEEK_READ | DD_CMD_SEEK_WRITE => {
                self.regs[ASIC_CUR_TK] = (self.regs[ASIC_DATA] >> 16) | 0x6000;
            }
            DD_CMD_RECALIBRATE => self.regs[ASIC_CUR_TK] = 0,
            DD_CMD_CLR_DSK_CHNG => self.regs[ASIC_CMD_STATUS] &= !DD_STATUS_DISK_CHNG,
            DD_CMD_CLR_RESET => self.regs[ASIC_CMD_STATUS] &= !DD_STATUS_RST_STATE,
            DD_CMD_READ_VERSION => self.regs[ASIC_DATA] = DD_ASIC_VERSION << 16,
            DD_CMD_FEATURE_INQ => self.regs[ASIC_DATA] = 0,
            DD_CMD_GET_RTC_YEAR_MONTH => {
                let year = now.year().rem_euclid(100) as u32;
                self.regs[ASIC_DATA] = (bcd(year) << 24) | (bcd(now.month()) << 16);
            }
            DD_CMD_GET_RTC_DAY_HOUR => {
                self.regs[ASIC_DATA] = (bcd(now.day()) << 24) | (bcd(now.hour()) << 16);
            }
            DD_CMD_GET_RTC_MINUTE_SECOND => {
                self.regs[ASIC_DATA] = (bcd(now.minute()) << 24) | (bcd(now.second()) << 16);
            }
            _ => log::trace!("DD: command 0x{:02X} has no modelled effect", cmd),
        }

        self.regs[ASIC_CMD_STATUS] |= DD_STATUS_BUSY_STATE;
        r4300.events.remove(InterruptKind::DdMecha);
        r4300.schedule(InterruptKind::DdMecha, DD_MECHA_DELAY);
    }

    fn bm_control(&mut self, value: u32, r4300: &mut R4300) {
        if value & BM_CTL_MECHA_RST != 0 {
            self.regs[ASIC_CMD_STATUS] &= !DD_STATUS_MECHA_INT;
        }
        if value & BM_CTL_RESET != 0 {
            self.regs[ASIC_CMD_STATUS] &=
                !(DD_STATUS_BM_INT | DD_STATUS_BM_ERR | DD_STATUS_DATA_RQ);
            r4300.events.remove(InterruptKind::DdBm);
        }
        if value & BM_CTL_START != 0 {
            r4300.events.remove(InterruptKind::DdBm);
            r4300.schedule(InterruptKind::DdBm, DD_BM_DELAY);
        }
        self.regs[ASIC_BM_STATUS_CTL] = value & !(BM_CTL_START | BM_CTL_RESET | BM_CTL_MECHA_RST);
        self.update_interrupt_line(&mut r4300.cp0);
    }

    /// IP3 follows the pending MECHA / BM interrupts
    fn update_interrupt_line(&self, cp0: &mut Cp0) {
        let pending = self.regs[ASIC_CMD_STATUS] & (DD_STATUS_MECHA_INT | DD_STATUS_BM_INT) != 0;
        cp0.set_interrupt_line(CAUSE_IP3, pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{FixedClock, MemoryStorage};
    use chrono::NaiveDate;

    const ASIC_DATA_ADDR: u32 = 0x0500_0500;
    const ASIC_CMD_STATUS_ADDR: u32 = 0x0500_0508;
    const ASIC_BM_STATUS_CTL_ADDR: u32 = 0x0500_0510;
    const ASIC_ID_ADDR: u32 = 0x0500_0540;

    fn dd(with_disk: bool) -> (DdController, R4300) {
        let instant = NaiveDate::from_ymd_opt(2001, 12, 25)
            .unwrap()
            .and_hms_opt(17, 45, 9)
            .unwrap();
        let disk: Option<Box<dyn StorageBackend>> = if with_disk {
            Some(Box::new(MemoryStorage::new()))
        } else {
            None
        };
        let rom: Vec<u8> = (0..0x1000u32).map(|i| (i >> 2) as u8).collect();
        let mut dd = DdController::new(rom, Box::new(FixedClock(instant)), disk);
        let mut r4300 = R4300::new(2);
        dd.poweron(&mut r4300);
        (dd, r4300)
    }

    fn command(dd: &mut DdController, r4300: &mut R4300, cmd: u32) {
        dd.write_regs(ASIC_CMD_STATUS_ADDR, cmd << 16, 0xFFFF_FFFF, r4300);
    }

    #[test]
    fn test_poweron_state() {
        let (mut dd, r4300) = dd(false);

        assert_eq!(dd.read_regs(ASIC_ID_ADDR), DD_ASIC_ID);
        assert_eq!(dd.status(), DD_STATUS_RST_STATE);
        assert!(r4300.events.is_empty());
    }

    #[test]
    fn test_disk_reported_after_poweron() {
        let (mut dd, mut r4300) = dd(true);
        assert_eq!(r4300.events.time_of(InterruptKind::DdDv), Some(DD_DV_DELAY));

        dd.disk_interrupt(&mut r4300.cp0);

        assert_ne!(dd.status() & DD_STATUS_DISK_PRES, 0);
        assert_ne!(r4300.cp0.cause() & CAUSE_IP3, 0);
    }

    #[test]
    fn test_rtc_commands_in_bcd() {
        let (mut dd, mut r4300) = dd(false);

        command(&mut dd, &mut r4300, DD_CMD_GET_RTC_YEAR_MONTH);
        assert_eq!(dd.read_regs(ASIC_DATA_ADDR), 0x0112_0000);

        command(&mut dd, &mut r4300, DD_CMD_GET_RTC_DAY_HOUR);
        assert_eq!(dd.read_regs(ASIC_DATA_ADDR), 0x2517_0000);

        command(&mut dd, &mut r4300, DD_CMD_GET_RTC_MINUTE_SECOND);
        assert_eq!(dd.read_regs(ASIC_DATA_ADDR), 0x4509_0000);
    }

    #[test]
    fn test_command_completes_with_mecha_interrupt() {
        let (mut dd, mut r4300) = dd(false);

        command(&mut dd, &mut r4300, DD_CMD_CLR_RESET);
        assert_eq!(dd.status(), DD_STATUS_BUSY_STATE);
        assert_eq!(r4300.events.time_of(InterruptKind::DdMecha), Some(DD_MECHA_DELAY));

        dd.mecha_interrupt(&mut r4300.cp0);
        assert_eq!(dd.status(), DD_STATUS_MECHA_INT);
        assert_ne!(r4300.cp0.cause() & CAUSE_IP3, 0);

        dd.write_regs(ASIC_BM_STATUS_CTL_ADDR, BM_CTL_MECHA_RST, 0xFFFF_FFFF, &mut r4300);
        assert_eq!(dd.status(), 0);
        assert_eq!(r4300.cp0.cause() & CAUSE_IP3, 0);
    }

    #[test]
    fn test_bm_start_and_reset() {
        let (mut dd, mut r4300) = dd(false);

        dd.write_regs(ASIC_BM_STATUS_CTL_ADDR, BM_CTL_START, 0xFFFF_FFFF, &mut r4300);
        assert_eq!(r4300.events.time_of(InterruptKind::DdBm), Some(DD_BM_DELAY));

        dd.bm_interrupt(&mut r4300.cp0);
        assert_ne!(dd.status() & DD_STATUS_BM_INT, 0);
        assert_ne!(r4300.cp0.cause() & CAUSE_IP3, 0);

        dd.write_regs(ASIC_BM_STATUS_CTL_ADDR, BM_CTL_RESET, 0xFFFF_FFFF, &mut r4300);
        assert_eq!(dd.status() & (DD_STATUS_BM_INT | DD_STATUS_DATA_RQ), 0);
        assert_eq!(r4300.cp0.cause() & CAUSE_IP3, 0);
    }

    #[test]
    fn test_buffers_and_rom() {
        let (mut dd, mut r4300) = dd(false);
        let mut rdram = Rdram::new(0x1000);

        dd.write_regs(0x0500_0400, 0xAABB_CCDD, 0xFFFF_FFFF, &mut r4300);
        assert_eq!(dd.read_regs(0x0500_0400), 0xAABB_CCDD);

        assert_eq!(dd.read_rom(0x0600_0010), 0x0404_0404);
        dd.dma_to_dram(0x0600_0100, &mut rdram, 0x40, 4);
        assert_eq!(&rdram.dram()[0x40..0x44], &[0x40; 4]);

        rdram.copy_in(0x80, &[1, 2, 3, 4]);
        dd.dma_from_dram(0x0500_0000, &rdram, 0x80, 4);
        assert_eq!(dd.read_regs(0x0500_0000), 0x0102_0304);
    }
}
