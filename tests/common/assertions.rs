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

//! Custom assertions for machine testing

use n64rx::core::device::Device;

/// Assert the CPU PC is at the expected address
#[allow(dead_code)]
pub fn assert_pc(device: &Device, expected: u32) {
    let actual = device.hardware().r4300.pc();
    assert_eq!(
        actual, expected,
        "PC mismatch: expected 0x{:08X}, got 0x{:08X}",
        expected, actual
    );
}

/// Assert a big-endian RDRAM word
#[allow(dead_code)]
pub fn assert_dram_word(device: &Device, address: u32, expected: u32) {
    let actual = device.hardware().rdram.read_dram(address);
    assert_eq!(
        actual, expected,
        "RDRAM[0x{:06X}] mismatch: expected 0x{:08X}, got 0x{:08X}",
        address, expected, actual
    );
}
