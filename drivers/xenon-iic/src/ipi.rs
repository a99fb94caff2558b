// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Inter-processor messages.
//!
//! Four priority codes are reserved for IPIs, one per logical message. A
//! message is sent by writing the target set and the code into the *sender's*
//! IPI dispatch register; the target sees the code in its own pending register
//! like any other source. There is no hardware broadcast: [`IpiTarget::AllOnline`]
//! is expanded into one write per online core.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::{
    error::{IicError, IicResult},
    prio::Priority,
};

bitflags! {
    /// Set of hardware threads, one bit per core.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CpuMask: u64 {
        const CPU0 = 1 << 0;
        const CPU1 = 1 << 1;
        const CPU2 = 1 << 2;
        const CPU3 = 1 << 3;
        const CPU4 = 1 << 4;
        const CPU5 = 1 << 5;
    }
}

impl CpuMask {
    /// Mask holding only `cpu`.
    #[inline]
    pub const fn of(cpu: usize) -> Self {
        Self::from_bits_retain(1 << cpu)
    }

    /// Core indices in the mask, lowest first.
    pub fn cpus(self) -> impl Iterator<Item = usize> {
        (0..u64::BITS as usize).filter(move |&cpu| self.bits() & (1 << cpu) != 0)
    }
}

/// Logical IPI messages, numbered like the host's message-passing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, EnumCount, IntoStaticStr)]
pub enum IpiMessage {
    CallFunction = 0,
    CallFunctionSingle = 1,
    Reschedule = 2,
    DebuggerBreak = 3,
}

impl IpiMessage {
    /// Reserved priority code carrying this message.
    pub const fn priority(self) -> Priority {
        match self {
            Self::CallFunction => Priority::Ipi1,
            Self::CallFunctionSingle => Priority::Ipi2,
            Self::Reschedule => Priority::Ipi3,
            Self::DebuggerBreak => Priority::Ipi4,
        }
    }

    /// Inverse of [`IpiMessage::priority`].
    pub const fn from_priority(prio: Priority) -> Option<Self> {
        match prio {
            Priority::Ipi1 => Some(Self::CallFunction),
            Priority::Ipi2 => Some(Self::CallFunctionSingle),
            Priority::Ipi3 => Some(Self::Reschedule),
            Priority::Ipi4 => Some(Self::DebuggerBreak),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl TryFrom<usize> for IpiMessage {
    type Error = IicError;

    fn try_from(raw: usize) -> IicResult<Self> {
        match raw {
            0 => Ok(Self::CallFunction),
            1 => Ok(Self::CallFunctionSingle),
            2 => Ok(Self::Reschedule),
            3 => Ok(Self::DebuggerBreak),
            _ => Err(IicError::UnknownIpiMessage(raw)),
        }
    }
}

/// Resolves a host message number.
///
/// # Panics
///
/// Panics on numbers outside the fixed message set. Such a number means the
/// host and the controller disagree on the IPI layout; carrying on would lose
/// that class of IPI silently.
pub fn message_from_raw(raw: usize) -> IpiMessage {
    match IpiMessage::try_from(raw) {
        Ok(msg) => msg,
        Err(e) => {
            error!("xenon IIC: {e}");
            panic!("{e}");
        }
    }
}

/// Destination of an IPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpiTarget {
    /// One specific core.
    Cpu(usize),
    /// Every online core, the sender included.
    AllOnline,
}

/// Bit position of the target set in the IPI dispatch word.
pub const IPI_TARGET_SHIFT: u32 = 16;

/// Word written to the sender's IPI dispatch register.
#[inline]
pub const fn dispatch_word(targets: CpuMask, prio: Priority) -> u64 {
    (targets.bits() << IPI_TARGET_SHIFT) | prio.code() as u64
}
