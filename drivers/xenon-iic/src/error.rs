// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::fmt;

/// Result type for IIC operations.
pub type IicResult<T = ()> = core::result::Result<T, IicError>;

/// Error types for IIC operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IicError {
    /// Core index outside the configured core count.
    InvalidCpu(usize),
    /// Hardware IRQ number outside the domain.
    InvalidHwIrq(usize),
    /// Host message number that has no IPI priority slot.
    UnknownIpiMessage(usize),
    /// The domain has no room for another mapping.
    MappingExhausted,
    /// Virtual IRQ has no mapping in the domain.
    NotMapped(usize),
    /// A handler is already installed for this virtual IRQ.
    AlreadyRegistered(usize),
    /// The pending register never reported idle during core bring-up.
    DrainTimeout {
        /// Core being brought up.
        cpu: usize,
        /// Pending register reads made, none of them idle.
        spins: usize,
    },
    /// No compatible controller node in the descriptor tree.
    ControllerNotFound,
    /// The controller node has no usable register window.
    BadRegisterWindow,
    /// The controller was already initialized.
    AlreadyInitialized,
}

impl fmt::Display for IicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidCpu(cpu) => write!(f, "invalid CPU {cpu}"),
            Self::InvalidHwIrq(hw) => write!(f, "hardware IRQ {hw:#x} out of range"),
            Self::UnknownIpiMessage(msg) => write!(f, "unhandled ipi {msg}"),
            Self::MappingExhausted => write!(f, "IRQ domain mappings exhausted"),
            Self::NotMapped(virq) => write!(f, "virq {virq} is not mapped"),
            Self::AlreadyRegistered(virq) => write!(f, "virq {virq} already has a handler"),
            Self::DrainTimeout { cpu, spins } => {
                write!(f, "CPU {cpu} pending register not idle after {spins} reads")
            }
            Self::ControllerNotFound => write!(f, "no xenon interrupt-controller node"),
            Self::BadRegisterWindow => write!(f, "can't resolve controller addresses"),
            Self::AlreadyInitialized => write!(f, "controller already initialized"),
        }
    }
}
