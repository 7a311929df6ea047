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

//! Interrupt Event Queue
//!
//! Hardware events (vertical interrupt, DMA completion, reset signals, ...)
//! are scheduled at absolute virtual times and dispatched by the CPU core at
//! its next interrupt checkpoint.
//!
//! # Ordering
//!
//! The queue is kept sorted by due time. Events due at the same time run in
//! the order they were added, and the same kind may be queued more than once:
//! a soft reset pressed twice enqueues two HW2/NMI pairs.
//!
//! # Example
//!
//! ```
//! use n64rx::core::r4300::{EventQueue, InterruptKind};
//!
//! let mut events = EventQueue::new();
//! events.add(InterruptKind::Nmi, 500);
//! events.add(InterruptKind::Hw2, 0);
//!
//! assert_eq!(events.next_time(), Some(0));
//! assert_eq!(events.pop_due(0).map(|e| e.kind), Some(InterruptKind::Hw2));
//! assert!(events.pop_due(499).is_none());
//! ```

use serde::Serialize;

/// Absolute virtual time in CPU cycles since power-on
pub type VirtualTime = u64;

/// Hardware event kind
///
/// One entry of the interrupt routing table exists per kind. The three disk
/// drive kinds are only routed when a disk drive is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InterruptKind {
    /// Video interface vertical interrupt
    Vi,
    /// CP0 count reached compare
    Compare,
    /// Forced checkpoint, no action
    Check,
    /// Serial interface DMA complete
    Si,
    /// Peripheral interface DMA complete
    Pi,
    /// CP0 housekeeping checkpoint
    Special,
    /// Audio interface DMA complete
    Ai,
    /// Signal processor task event
    Sp,
    /// Display processor event
    Dp,
    /// PIF reset signal (pre-NMI)
    Hw2,
    /// Non-maskable interrupt (soft reset)
    Nmi,
    /// Full machine reset
    ResetHard,
    /// Signal processor DMA complete
    RspDma,
    /// Disk drive mechanism interrupt
    DdMecha,
    /// Disk drive buffer manager interrupt
    DdBm,
    /// Disk drive disk change / drive ready
    DdDv,
}

impl InterruptKind {
    /// Number of event kinds
    pub const COUNT: usize = 16;

    /// Every event kind in routing table order
    pub const ALL: [InterruptKind; Self::COUNT] = [
        InterruptKind::Vi,
        InterruptKind::Compare,
        InterruptKind::Check,
        InterruptKind::Si,
        InterruptKind::Pi,
        InterruptKind::Special,
        InterruptKind::Ai,
        InterruptKind::Sp,
        InterruptKind::Dp,
        InterruptKind::Hw2,
        InterruptKind::Nmi,
        InterruptKind::ResetHard,
        InterruptKind::RspDma,
        InterruptKind::DdMecha,
        InterruptKind::DdBm,
        InterruptKind::DdDv,
    ];

    /// Position of this kind in the routing table
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this kind belongs to the optional disk drive
    pub const fn is_disk_drive(self) -> bool {
        matches!(
            self,
            InterruptKind::DdMecha | InterruptKind::DdBm | InterruptKind::DdDv
        )
    }
}

/// One queued hardware event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterruptEvent {
    /// Event kind
    pub kind: InterruptKind,
    /// Absolute virtual time the event is due at
    pub time: VirtualTime,
}

/// Time-ordered queue of pending hardware events
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    /// Pending events, sorted by time (FIFO within equal times)
    events: Vec<InterruptEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Schedule `kind` at absolute virtual time `time`
    ///
    /// # Arguments
    ///
    /// * `kind` - Event kind to dispatch
    /// * `time` - Absolute virtual time in CPU cycles
    pub fn add(&mut self, kind: InterruptKind, time: VirtualTime) {
        // after every event due at or before `time`
        let position = self.events.partition_point(|e| e.time <= time);
        self.events.insert(position, InterruptEvent { kind, time });

        log::trace!("Event {:?} scheduled at {}", kind, time);
    }

    /// Remove every queued event of `kind`
    pub fn remove(&mut self, kind: InterruptKind) {
        self.events.retain(|e| e.kind != kind);
    }

    /// Due time of the earliest queued event
    #[inline]
    pub fn next_time(&self) -> Option<VirtualTime> {
        self.events.first().map(|e| e.time)
    }

    /// Pop the earliest event if it is due at `now`
    pub fn pop_due(&mut self, now: VirtualTime) -> Option<InterruptEvent> {
        match self.events.first() {
            Some(event) if event.time <= now => Some(self.events.remove(0)),
            _ => None,
        }
    }

    /// Due time of the first queued event of `kind`
    pub fn time_of(&self, kind: InterruptKind) -> Option<VirtualTime> {
        self.events.iter().find(|e| e.kind == kind).map(|e| e.time)
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Pending events in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = &InterruptEvent> {
        self.events.iter()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
