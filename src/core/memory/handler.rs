// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory Handler Trait
//!
//! This module defines the trait through which self-contained devices answer
//! bus accesses. Devices whose register writes have effects on other
//! controllers (DMA engines, interrupt sources) are routed by the device
//! aggregate together with the controllers they need; plain register files
//! and memories implement [`MemoryHandler`] and are routed directly.
//!
//! # Access Model
//!
//! Every access is a full 32-bit word at a physical address. Narrower stores
//! arrive as a word plus a byte-lane mask, so a handler only ever merges the
//! masked bits:
//!
//! ```text
//! sb 0xAB at 0x..01  →  value = 0x00AB0000, mask = 0x00FF0000
//! sh 0x1234 at 0x..02 → value = 0x00001234, mask = 0x0000FFFF
//! ```
//!
//! # Example
//!
//! ```
//! use n64rx::core::memory::{MemoryHandler, RegisterFile};
//!
//! let mut regs: RegisterFile<4> = RegisterFile::new();
//! regs.write_word(0x0470_0004, 0x1234_5678, 0x0000_FFFF);
//! assert_eq!(regs.read_word(0x0470_0004), 0x0000_5678);
//! ```

use super::masked_write;

/// Trait for bus-addressable devices
///
/// # Thread Safety
///
/// Handlers do not need to be `Send` or `Sync`; the bus is driven from the
/// single thread that runs the CPU core.
pub trait MemoryHandler {
    /// Read the 32-bit word at a physical address
    ///
    /// Takes `&mut self` because some reads have side effects (latches,
    /// status acknowledge).
    fn read_word(&mut self, address: u32) -> u32;

    /// Write the bits of `value` selected by `mask` at a physical address
    fn write_word(&mut self, address: u32, value: u32, mask: u32);

    /// Device name for debugging
    fn name(&self) -> &str {
        "Unknown Device"
    }
}

/// Plain file of `N` 32-bit registers answering a 64 KiB window
///
/// Registers are indexed by `(address & 0xFFFF) >> 2`; reads past the last
/// register return 0 and writes past it are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile<const N: usize> {
    regs: [u32; N],
}

impl<const N: usize> RegisterFile<N> {
    /// Create a register file with every register cleared
    pub const fn new() -> Self {
        Self { regs: [0; N] }
    }

    /// Register index for a physical address
    #[inline(always)]
    pub const fn index(address: u32) -> usize {
        ((address & 0xFFFF) >> 2) as usize
    }

    /// Get register `index`
    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.regs[index]
    }

    /// Set register `index`
    #[inline]
    pub fn set(&mut self, index: usize, value: u32) {
        self.regs[index] = value;
    }

    /// Get a mutable reference to register `index`
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut u32 {
        &mut self.regs[index]
    }

    /// Clear every register
    pub fn reset(&mut self) {
        self.regs = [0; N];
    }

    /// Byte view of the register file (host byte order)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.regs)
    }
}

impl<const N: usize> Default for RegisterFile<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryHandler for RegisterFile<N> {
    fn read_word(&mut self, address: u32) -> u32 {
        self.regs.get(Self::index(address)).copied().unwrap_or(0)
    }

    fn write_word(&mut self, address: u32, value: u32, mask: u32) {
        if let Some(reg) = self.regs.get_mut(Self::index(address)) {
            masked_write(reg, value, mask);
        }
    }

    fn name(&self) -> &str {
        "Register File"
    }
}
