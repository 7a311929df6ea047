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

//! VR4300 CPU core shell
//!
//! This module holds the architectural state the device layer depends on and
//! the execution loop that drives the whole machine. Instruction semantics
//! are supplied by an [`ExecutionCore`] implementation; the shell owns:
//!
//! - the program counter and CP0 (count/compare/cause/status)
//! - absolute virtual time and the interrupt event queue
//! - the deferred stop flag and hard reset job
//! - the interrupt routing table registered at composition
//!
//! # Execution Loop
//!
//! ```text
//! loop until stop flag:
//!   core.step(bus)            ── bus / DMA activity happens in here
//!   advance virtual time
//!   if hard reset job or next event due:
//!       checkpoint            ── hard reset first, else every due event
//! ```

mod cp0;
mod events;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::device::{Hardware, InterruptTable};
use crate::core::memory::{translate_address, Bus};

pub use cp0::*;
pub use events::{EventQueue, InterruptEvent, InterruptKind, VirtualTime};

/// Reset vector of the VR4300 (PIF boot ROM)
pub const RESET_VECTOR: u32 = 0xBFC0_0000;

/// Handle for requesting a deferred stop of the execution loop
///
/// Cloneable and thread-safe: a frontend can keep one and call
/// [`StopHandle::stop`] from a UI callback or signal handler while
/// [`Device::run`](crate::core::device::Device::run) occupies the emulation
/// thread. The request is observed by the loop at its next iteration.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the execution loop to exit
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether a stop has been requested and not yet consumed
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Instruction execution strategy plugged into the CPU shell
///
/// Implementations fetch and execute instructions through the
/// [`SystemBus`], which routes every access through the mapping table.
pub trait ExecutionCore {
    /// Execute one step
    ///
    /// # Returns
    ///
    /// Number of instructions retired. Virtual time advances by this count
    /// times the configured cycles per instruction.
    fn step(&mut self, bus: &mut SystemBus<'_>) -> u32;

    /// Core name for debugging
    fn name(&self) -> &str {
        "Unknown Core"
    }
}

/// CPU core state
pub struct R4300 {
    /// Program counter (virtual)
    pc: u32,

    /// Coprocessor 0
    pub cp0: Cp0,

    /// Absolute virtual time in CPU cycles since power-on
    cycles: VirtualTime,

    /// Pending hardware events
    pub events: EventQueue,

    /// Deferred stop flag, shared with every [`StopHandle`]
    stop: Arc<AtomicBool>,

    /// Full reset requested for the next checkpoint
    reset_hard_job: bool,

    /// Cycles per retired instruction
    count_per_op: u32,

    /// Interrupt routing table, registered once at composition
    handlers: Option<InterruptTable>,
}

impl R4300 {
    /// Create a CPU shell
    ///
    /// # Arguments
    ///
    /// * `count_per_op` - Cycles per retired instruction
    pub fn new(count_per_op: u32) -> Self {
        Self {
            pc: RESET_VECTOR,
            cp0: Cp0::new(),
            cycles: 0,
            events: EventQueue::new(),
            stop: Arc::new(AtomicBool::new(false)),
            reset_hard_job: false,
            count_per_op,
            handlers: None,
        }
    }

    /// Reset architectural state and virtual time
    ///
    /// The stop flag and the routing table are not touched.
    pub fn poweron(&mut self) {
        self.pc = RESET_VECTOR;
        self.cp0.reset();
        self.cycles = 0;
        self.events.clear();
        self.reset_hard_job = false;
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// Current virtual time
    #[inline]
    pub fn cycles(&self) -> VirtualTime {
        self.cycles
    }

    /// Cycles per retired instruction
    pub fn count_per_op(&self) -> u32 {
        self.count_per_op
    }

    /// Advance virtual time (and CP0 Count) by `retired` instructions
    pub fn advance(&mut self, retired: u32) {
        let elapsed = retired as u64 * self.count_per_op as u64;
        self.cycles += elapsed;
        self.cp0.regs[Cp0::COUNT] = self.cp0.count().wrapping_add(elapsed as u32);
    }

    /// Schedule `kind` `delay` cycles from now
    pub fn schedule(&mut self, kind: InterruptKind, delay: u64) {
        self.events.add(kind, self.cycles + delay);
    }

    /// Replace any queued compare event with one at the next Count == Compare
    pub fn schedule_compare(&mut self) {
        self.events.remove(InterruptKind::Compare);
        let delay = self.cp0.cycles_to_compare();
        self.schedule(InterruptKind::Compare, delay);
    }

    /// Write a CP0 register with its timer side effects
    pub fn write_cp0(&mut self, reg: usize, value: u32) {
        self.cp0.regs[reg] = value;
        match reg {
            Cp0::COMPARE => {
                self.cp0.set_interrupt_line(CAUSE_IP7, false);
                self.schedule_compare();
            }
            Cp0::COUNT => self.schedule_compare(),
            _ => {}
        }
    }

    /// Get a handle for requesting a deferred stop
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Request the execution loop to exit
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Request a full reset at the next checkpoint
    pub fn request_hard_reset(&mut self) {
        self.reset_hard_job = true;
    }

    /// Check whether a full reset is waiting for the next checkpoint
    pub fn hard_reset_pending(&self) -> bool {
        self.reset_hard_job
    }

    /// Register the interrupt routing table
    ///
    /// # Panics
    ///
    /// Panics if a table is already registered; the routing is fixed for the
    /// lifetime of the machine.
    pub fn register_interrupt_handlers(&mut self, table: InterruptTable) {
        assert!(
            self.handlers.is_none(),
            "interrupt handlers are already registered"
        );
        log::debug!("Registered {} interrupt handlers", table.len());
        self.handlers = Some(table);
    }

    /// Get the registered routing table
    pub fn interrupt_handlers(&self) -> Option<&InterruptTable> {
        self.handlers.as_ref()
    }

    /// Whether the loop must take a checkpoint now
    #[inline]
    fn checkpoint_due(&self) -> bool {
        self.reset_hard_job || self.events.next_time().is_some_and(|t| t <= self.cycles)
    }
}

/// The execution core's view of the machine
///
/// Routes virtual-address accesses through KSEG0/KSEG1 translation and the
/// bus, and exposes the CPU shell state an instruction set needs.
pub struct SystemBus<'a> {
    bus: &'a Bus,
    hw: &'a mut Hardware,
}

impl<'a> SystemBus<'a> {
    pub(crate) fn new(bus: &'a Bus, hw: &'a mut Hardware) -> Self {
        Self { bus, hw }
    }

    /// Read a word at a virtual address
    pub fn read_word(&mut self, vaddr: u32) -> u32 {
        self.bus.read(&mut *self.hw, translate_address(vaddr))
    }

    /// Write the bits of `value` selected by `mask` at a virtual address
    pub fn write_word(&mut self, vaddr: u32, value: u32, mask: u32) {
        self.bus
            .write(&mut *self.hw, translate_address(vaddr), value, mask);
    }

    pub fn pc(&self) -> u32 {
        self.hw.r4300.pc()
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.hw.r4300.set_pc(pc);
    }

    pub fn cp0(&self) -> &Cp0 {
        &self.hw.r4300.cp0
    }

    /// Write a CP0 register (MTC0)
    pub fn write_cp0(&mut self, reg: usize, value: u32) {
        self.hw.r4300.write_cp0(reg, value);
    }

    /// Current virtual time
    pub fn cycles(&self) -> VirtualTime {
        self.hw.r4300.cycles()
    }

    /// Ask the execution loop to exit after this step
    pub fn request_stop(&self) {
        self.hw.r4300.request_stop();
    }
}

/// Fetch-and-advance execution core
///
/// Fetches one word per step through the bus and moves to the next
/// instruction without executing it. Exercises instruction fetch, virtual
/// time and interrupt checkpoints end to end; with a budget it stops the
/// loop by itself after that many instructions.
#[derive(Debug, Default)]
pub struct FetchCore {
    budget: Option<u64>,
    retired: u64,
    last_fetch: u32,
}

impl FetchCore {
    /// Create a core that runs until stopped externally
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a core that stops the loop after `instructions` steps
    pub fn with_budget(instructions: u64) -> Self {
        Self {
            budget: Some(instructions),
            ..Self::default()
        }
    }

    /// Instructions fetched so far
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Last fetched instruction word
    pub fn last_fetch(&self) -> u32 {
        self.last_fetch
    }
}

impl ExecutionCore for FetchCore {
    fn step(&mut self, bus: &mut SystemBus<'_>) -> u32 {
        if self.budget.is_some_and(|budget| self.retired >= budget) {
            bus.request_stop();
            return 0;
        }

        let pc = bus.pc();
        self.last_fetch = bus.read_word(pc);
        bus.set_pc(pc.wrapping_add(4));
        self.retired += 1;
        1
    }

    fn name(&self) -> &str {
        "Fetch Core"
    }
}

/// Drive the machine until the stop flag is raised
///
/// Clears any stale stop request on entry, then alternates execution steps
/// and interrupt checkpoints.
pub(crate) fn run(bus: &Bus, hw: &mut Hardware, core: &mut dyn ExecutionCore) {
    hw.r4300.stop.store(false, Ordering::Relaxed);
    log::info!("Execution started ({}) at PC 0x{:08X}", core.name(), hw.r4300.pc());

    while !hw.r4300.stop_requested() {
        let retired = core.step(&mut SystemBus::new(bus, hw));
        hw.r4300.advance(retired);

        if hw.r4300.checkpoint_due() {
            checkpoint(hw);
        }
    }

    log::info!(
        "Execution stopped at PC 0x{:08X} after {} cycles",
        hw.r4300.pc(),
        hw.r4300.cycles()
    );
}

/// Interrupt checkpoint: a pending hard reset wins, else every due event runs
pub(crate) fn checkpoint(hw: &mut Hardware) {
    if hw.r4300.reset_hard_job {
        hw.r4300.reset_hard_job = false;
        dispatch(hw, InterruptKind::ResetHard);
        return;
    }

    while let Some(event) = hw.r4300.events.pop_due(hw.r4300.cycles) {
        dispatch(hw, event.kind);
    }
}

fn dispatch(hw: &mut Hardware, kind: InterruptKind) {
    let handler = hw.r4300.handlers.as_ref().and_then(|table| table.get(kind));
    match handler {
        Some(handler) => {
            log::trace!("Dispatching {:?} to {:?}", kind, handler.owner);
            (handler.run)(hw);
        }
        None => log::warn!("No handler routed for {:?}", kind),
    }
}
