// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Bridge slot routing.
//!
//! Each of the sixteen slot registers either holds zero (line detached) or a
//! routing word that forwards the line to core 0 under the slot's priority.
//! Every write replaces the whole register, so concurrent connects and
//! disconnects of the same code settle on whichever write lands last without
//! a lock.

use crate::{
    prio::{NR_BRIDGE_SLOTS, bridge_slots},
    regs::{MmioOps, biu, bridge},
};

/// Routing word that delivers a slot to core 0; the low bits carry `code / 4`.
pub const ROUTE_TO_CPU0: u32 = 0x0080_0180;

/// Bridge register offset of a routing slot.
#[inline]
pub const fn slot_offset(slot: usize) -> usize {
    bridge::SLOT_BASE + slot * 4
}

/// Routing word written by [`Bridge::connect`] for `code`.
#[inline]
pub const fn route_word(code: u8) -> u32 {
    ROUTE_TO_CPU0 | (code as u32 / 4)
}

/// View of the routing bridge.
pub struct Bridge<'a, M> {
    bridge: &'a M,
    biu: &'a M,
}

impl<'a, M: MmioOps> Bridge<'a, M> {
    pub fn new(bridge: &'a M, biu: &'a M) -> Self {
        Self { bridge, biu }
    }

    /// Brings the bridge up and points the BIU at it.
    pub fn init(&self) {
        self.bridge.write_le32(bridge::CONFIG, 0);
        self.bridge.write_le32(bridge::TIMEOUT, 0x4000_0000);
        self.biu.write_le32(biu::BRIDGE_WINDOW, 0x4000_0000);
        self.biu.write_le32(biu::BRIDGE_TARGET, 0xea00_0050);
        self.bridge.write_le32(bridge::ERROR_MASK, 0);
        self.bridge.write_le32(bridge::CONFIG, 0x3);
    }

    /// Forwards every slot wired to `code` to core 0.
    pub fn connect(&self, code: u8) {
        debug!("xenon IIC: connect irq {code:#04x}");
        for slot in bridge_slots(code) {
            self.bridge.write_le32(slot_offset(slot), route_word(code));
        }
    }

    /// Detaches every slot wired to `code`.
    pub fn disconnect(&self, code: u8) {
        debug!("xenon IIC: disconnect irq {code:#04x}");
        for slot in bridge_slots(code) {
            self.bridge.write_le32(slot_offset(slot), 0);
        }
    }

    /// Detaches all slots; lines stay off until a consumer unmasks them.
    pub fn disconnect_all(&self) {
        for slot in 0..NR_BRIDGE_SLOTS {
            self.bridge.write_le32(slot_offset(slot), 0);
        }
    }

    pub fn is_connected(&self, slot: usize) -> bool {
        slot < NR_BRIDGE_SLOTS && self.bridge.read_le32(slot_offset(slot)) != 0
    }
}
