// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Simulated Xenon interrupt hardware.
//!
//! [`SimBoard`] models just enough of the board to exercise the controller
//! protocol on a host:
//!
//! - each core's pending register is a set of latched codes; a read of the
//!   ack register consumes and returns the highest one, or idle;
//! - IPI dispatch writes latch the code on every target core;
//! - bridge slots forward an assertion to core 0 only while connected;
//! - graphics, IOC and clock hold their own pending bit, re-latching on every
//!   EOI until their side-channel register is written.
//!
//! Every access is recorded so tests can check ordering.

use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};

use kspin::SpinNoIrq;

use crate::{
    iic::MAX_CPUS,
    prio::{BRIDGE_SLOT_MAP, CODE_MASK, IDLE, NR_BRIDGE_SLOTS, Priority, bridge_slots},
    regs::{MmioOps, XenonWindows, biu, bridge, graphics, iic},
    route::slot_offset,
};

/// Which window an access went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WindowKind {
    Iic,
    Bridge,
    Biu,
    Graphics,
}

/// One recorded register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(WindowKind, usize),
    Write(WindowKind, usize, u64),
    Barrier(WindowKind),
}

#[derive(Default)]
struct BoardState {
    regs: BTreeMap<(WindowKind, usize), u64>,
    pending: [u128; MAX_CPUS],
    jammed: [Option<u8>; MAX_CPUS],
    self_latched: u128,
    log: Vec<Access>,
}

impl BoardState {
    fn reg(&self, kind: WindowKind, offset: usize) -> u64 {
        self.regs.get(&(kind, offset)).copied().unwrap_or(0)
    }

    fn latch(&mut self, cpu: usize, code: u8) {
        self.pending[cpu] |= 1 << (code as u64 & CODE_MASK);
    }

    fn slot_connected(&self, slot: usize) -> bool {
        self.reg(WindowKind::Bridge, slot_offset(slot)) != 0
    }

    /// Whether `prio` currently reaches the controller.
    fn deliverable(&self, prio: Priority) -> bool {
        let mut slots = bridge_slots(prio.code()).peekable();
        slots.peek().is_none() || slots.any(|slot| self.slot_connected(slot))
    }

    fn relatch_peripherals(&mut self) {
        for prio in SELF_LATCHING {
            if self.self_latched & (1 << prio.code()) != 0 && self.deliverable(prio) {
                self.latch(0, prio.code());
            }
        }
    }

    fn read_ack(&mut self, cpu: usize) -> u64 {
        if let Some(code) = self.jammed[cpu] {
            return code as u64;
        }
        let pending = self.pending[cpu];
        if pending == 0 {
            return IDLE as u64;
        }
        let code = 127 - pending.leading_zeros();
        self.pending[cpu] &= !(1 << code);
        code as u64
    }

    fn iic_write(&mut self, offset: usize, value: u64) {
        let (cpu, reg) = (offset / iic::CPU_STRIDE, offset % iic::CPU_STRIDE);
        match reg {
            iic::IPI_DISPATCH => {
                let targets = (value >> 16) & ((1 << MAX_CPUS) - 1);
                for dest in 0..MAX_CPUS {
                    if targets & (1 << dest) != 0 {
                        self.latch(dest, (value & CODE_MASK) as u8);
                    }
                }
            }
            iic::EOI_PRI if cpu < MAX_CPUS => self.relatch_peripherals(),
            _ => {}
        }
    }

    fn aux_write(&mut self, kind: WindowKind, offset: usize) {
        let cleared = match (kind, offset) {
            (WindowKind::Graphics, graphics::IRQ_ACK | graphics::IRQ_STATUS) => {
                Some(Priority::Graphics)
            }
            (WindowKind::Biu, biu::IOC_ACK) => Some(Priority::Ioc),
            (WindowKind::Bridge, bridge::CLOCK_ACK) => Some(Priority::Clock),
            _ => None,
        };
        if let Some(prio) = cleared {
            self.self_latched &= !(1 << prio.code());
        }
    }
}

/// Sources that keep their own pending bit.
const SELF_LATCHING: [Priority; 3] = [Priority::Graphics, Priority::Ioc, Priority::Clock];

/// A simulated board. Share it between windows with [`SimBoard::windows`].
pub struct SimBoard {
    state: SpinNoIrq<BoardState>,
}

impl SimBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: SpinNoIrq::new(BoardState::default()),
        })
    }

    /// All four windows of the board.
    pub fn windows(self: &Arc<Self>) -> XenonWindows<SimWindow> {
        let window = |kind| SimWindow {
            board: self.clone(),
            kind,
        };
        XenonWindows {
            iic: window(WindowKind::Iic),
            bridge: window(WindowKind::Bridge),
            biu: window(WindowKind::Biu),
            graphics: window(WindowKind::Graphics),
        }
    }

    /// Latches `code` on `cpu` directly, as an internal source would.
    pub fn latch(&self, cpu: usize, code: u8) {
        self.state.lock().latch(cpu, code);
    }

    /// Asserts the peripheral line on bridge `slot`.
    ///
    /// Returns whether the assertion reached the controller.
    pub fn assert_slot(&self, slot: usize) -> bool {
        let mut state = self.state.lock();
        let word = state.reg(WindowKind::Bridge, slot_offset(slot));
        if slot >= NR_BRIDGE_SLOTS || word == 0 {
            return false;
        }
        state.latch(0, ((word & CODE_MASK) << 2) as u8);
        true
    }

    /// Raises source `prio`, through the bridge when it is bridge-routed.
    pub fn raise(&self, prio: Priority) -> bool {
        let mut state = self.state.lock();
        if SELF_LATCHING.contains(&prio) {
            state.self_latched |= 1 << prio.code();
        }
        let routed = BRIDGE_SLOT_MAP.contains(&Some(prio));
        if !routed || state.deliverable(prio) {
            state.latch(0, prio.code());
            true
        } else {
            false
        }
    }

    /// Makes `cpu`'s pending register report `code` forever.
    pub fn jam(&self, cpu: usize, code: u8) {
        self.state.lock().jammed[cpu] = Some(code);
    }

    /// Codes latched on `cpu`, highest first, without consuming them.
    pub fn pending(&self, cpu: usize) -> Vec<u8> {
        let pending = self.state.lock().pending[cpu];
        (0..128u8)
            .rev()
            .filter(|&code| pending & (1 << code) != 0)
            .collect()
    }

    /// Last value written to a bridge register.
    pub fn bridge_reg(&self, offset: usize) -> u32 {
        self.state.lock().reg(WindowKind::Bridge, offset) as u32
    }

    /// Last value written to `cpu`'s IIC register `reg`.
    pub fn iic_reg(&self, cpu: usize, reg: usize) -> u64 {
        self.state
            .lock()
            .reg(WindowKind::Iic, cpu * iic::CPU_STRIDE + reg)
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.state.lock().log.clone()
    }

    pub fn clear_accesses(&self) {
        self.state.lock().log.clear();
    }
}

/// One window of a [`SimBoard`].
pub struct SimWindow {
    board: Arc<SimBoard>,
    kind: WindowKind,
}

impl SimWindow {
    fn read(&self, offset: usize) -> u64 {
        let mut state = self.board.state.lock();
        state.log.push(Access::Read(self.kind, offset));
        match self.kind {
            WindowKind::Iic if offset % iic::CPU_STRIDE == iic::ACK => {
                state.read_ack(offset / iic::CPU_STRIDE)
            }
            kind => state.reg(kind, offset),
        }
    }

    fn write(&self, offset: usize, value: u64) {
        let mut state = self.board.state.lock();
        state.log.push(Access::Write(self.kind, offset, value));
        state.regs.insert((self.kind, offset), value);
        match self.kind {
            WindowKind::Iic => state.iic_write(offset, value),
            kind => state.aux_write(kind, offset),
        }
    }
}

impl MmioOps for SimWindow {
    fn read_be64(&self, offset: usize) -> u64 {
        self.read(offset)
    }

    fn write_be64(&self, offset: usize, value: u64) {
        self.write(offset, value)
    }

    fn read_le32(&self, offset: usize) -> u32 {
        self.read(offset) as u32
    }

    fn write_le32(&self, offset: usize, value: u32) {
        self.write(offset, value as u64)
    }

    fn barrier(&self) {
        self.board.state.lock().log.push(Access::Barrier(self.kind));
    }
}
