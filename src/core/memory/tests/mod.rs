// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Memory Layer Tests
//!
//! Tests for the address-space layer, organized into logical categories:
//!
//! - `map`: Mapping table layout and disk drive slot substitution
//! - `bus`: Dispatch, priority and open-bus behavior
//! - `dma`: PI DMA band resolution
//! - `host`: Host memory map export
//! - `helpers`: Common test utilities

use super::*;

mod bus;
mod helpers;
mod host;
