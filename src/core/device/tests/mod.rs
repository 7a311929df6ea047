// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Device Tests
//!
//! Tests for the composed machine, organized into logical categories:
//!
//! - `composition`: Controller set, routing table and host export
//! - `lifecycle`: Power-on, run, stop and both resets
//! - `access`: Bus accesses and DMA routed through the hardware aggregate
//! - `helpers`: Common test utilities

use super::*;

mod helpers;
