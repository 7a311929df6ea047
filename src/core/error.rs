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

/// Emulator error types
///
/// Only the outer surface (image loading, configuration) reports errors as
/// values. Bus accesses, DMA resolution, interrupt dispatch and the lifecycle
/// entry points have no error channel.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("ROM file not found: {0}")]
    RomNotFound(String),

    #[error("Invalid ROM size: {got} bytes (expected {constraint})")]
    InvalidRomSize { got: usize, constraint: &'static str },

    #[error("Unrecognized ROM byte order (first word 0x{magic:08X})")]
    UnknownRomFormat { magic: u32 },

    #[error("Invalid RDRAM size: {0} bytes (expected 4 MiB or 8 MiB)")]
    InvalidDramSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
