// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! The controller's fixed priority-code space.
//!
//! Codes are hardware constants; the set is closed and sparse. A code is also
//! the key used for masking and the virtual IRQ number in the no-map domain.

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// Value the pending register reports when nothing is latched.
pub const IDLE: u8 = 0x7c;

/// Significant bits of a pending-register read.
pub const CODE_MASK: u64 = 0x7f;

/// Number of code slots (and of virtual IRQs in the domain).
pub const NR_IRQS: usize = 0x80;

/// Number of bridge routing slots.
pub const NR_BRIDGE_SLOTS: usize = 0x10;

/// Interrupt sources known to the controller.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumIter, EnumCount, IntoStaticStr)]
pub enum Priority {
    Ipi4 = 0x08,
    Ipi3 = 0x10,
    Smm = 0x14,
    Sfcx = 0x18,
    SataHdd = 0x20,
    SataCdrom = 0x24,
    Ohci0 = 0x2c,
    Ehci0 = 0x30,
    Ohci1 = 0x34,
    Ehci1 = 0x38,
    Xma = 0x40,
    Audio = 0x44,
    Enet = 0x4c,
    Xps = 0x54,
    Graphics = 0x58,
    Profiler = 0x60,
    Biu = 0x64,
    Ioc = 0x68,
    Fsb = 0x6c,
    Ipi2 = 0x70,
    Clock = 0x74,
    Ipi1 = 0x78,
}

impl Priority {
    /// Looks up a raw code; reserved and idle codes yield `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        use Priority::*;
        Some(match code {
            0x08 => Ipi4,
            0x10 => Ipi3,
            0x14 => Smm,
            0x18 => Sfcx,
            0x20 => SataHdd,
            0x24 => SataCdrom,
            0x2c => Ohci0,
            0x30 => Ehci0,
            0x34 => Ohci1,
            0x38 => Ehci1,
            0x40 => Xma,
            0x44 => Audio,
            0x4c => Enet,
            0x54 => Xps,
            0x58 => Graphics,
            0x60 => Profiler,
            0x64 => Biu,
            0x68 => Ioc,
            0x6c => Fsb,
            0x70 => Ipi2,
            0x74 => Clock,
            0x78 => Ipi1,
            _ => return None,
        })
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether this code is one of the four reserved IPI slots.
    pub const fn is_ipi(self) -> bool {
        matches!(self, Self::Ipi1 | Self::Ipi2 | Self::Ipi3 | Self::Ipi4)
    }
}

/// Bridge slot to priority code. `None` slots are not wired to anything.
pub static BRIDGE_SLOT_MAP: [Option<Priority>; NR_BRIDGE_SLOTS] = [
    Some(Priority::Clock),
    Some(Priority::SataCdrom),
    Some(Priority::SataHdd),
    Some(Priority::Smm),
    Some(Priority::Ohci0),
    Some(Priority::Ehci0),
    Some(Priority::Ohci1),
    Some(Priority::Ehci1),
    None,
    None,
    Some(Priority::Enet),
    Some(Priority::Xma),
    Some(Priority::Audio),
    Some(Priority::Sfcx),
    None,
    None,
];

/// Priority wired to a bridge slot, if any.
pub fn slot_priority(slot: usize) -> Option<Priority> {
    BRIDGE_SLOT_MAP.get(slot).copied().flatten()
}

/// Every bridge slot routed to `code`.
///
/// Most codes have at most one slot and many have none; callers must not
/// assume either.
pub fn bridge_slots(code: u8) -> impl Iterator<Item = usize> {
    BRIDGE_SLOT_MAP
        .iter()
        .enumerate()
        .filter(move |(_, p)| p.is_some_and(|p| p.code() == code))
        .map(|(slot, _)| slot)
}
