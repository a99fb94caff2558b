// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::fmt;

/// Result type for SMC operations.
pub type SmcResult<T = ()> = core::result::Result<T, SmcError>;

/// Error types for SMC operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmcError {
    /// The transmit FIFO never reported ready.
    FifoBusy {
        /// Status reads made, none of them ready.
        spins: usize,
    },
    /// No reply to `command` arrived.
    ReplyTimeout {
        /// Command byte of the message left waiting.
        command: u8,
        /// Checks made, none of them matching.
        spins: usize,
    },
}

impl fmt::Display for SmcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FifoBusy { spins } => write!(f, "tx fifo not ready after {spins} reads"),
            Self::ReplyTimeout { command, spins } => {
                write!(f, "no reply to {command:#04x} after {spins} checks")
            }
        }
    }
}
