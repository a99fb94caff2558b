// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Auxiliary acknowledgments for self-latching peripherals.
//!
//! A few sources keep their own pending bit next to the controller's. Unless
//! that bit is cleared before EOI, the line fires again immediately. The table
//! below is the complete list; it is applied on every claim of these codes,
//! whether or not a handler is installed.

use crate::{
    prio::Priority,
    regs::{XenonWindows, biu, bridge, graphics},
};

/// Window an auxiliary acknowledgment is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxWindow {
    Bridge,
    Biu,
    Graphics,
}

/// A zero-write to one auxiliary register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxAck {
    pub window: AuxWindow,
    pub offset: usize,
}

impl AuxAck {
    const fn new(window: AuxWindow, offset: usize) -> Self {
        Self { window, offset }
    }

    /// Performs the acknowledgment.
    pub fn apply<M: crate::MmioOps>(&self, windows: &XenonWindows<M>) {
        let mmio = match self.window {
            AuxWindow::Bridge => &windows.bridge,
            AuxWindow::Biu => &windows.biu,
            AuxWindow::Graphics => &windows.graphics,
        };
        mmio.write_le32(self.offset, 0);
    }
}

/// Codes whose peripheral needs a side-channel acknowledgment.
pub static SIDE_CHANNEL_ACKS: [(Priority, &[AuxAck]); 3] = [
    (
        Priority::Graphics,
        &[
            AuxAck::new(AuxWindow::Graphics, graphics::IRQ_ACK),
            AuxAck::new(AuxWindow::Graphics, graphics::IRQ_STATUS),
        ],
    ),
    (Priority::Ioc, &[AuxAck::new(AuxWindow::Biu, biu::IOC_ACK)]),
    (
        Priority::Clock,
        &[AuxAck::new(AuxWindow::Bridge, bridge::CLOCK_ACK)],
    ),
];

/// Acknowledgments to perform for `code`, in order. Empty for most codes.
pub fn side_channel_acks(code: u8) -> &'static [AuxAck] {
    SIDE_CHANNEL_ACKS
        .iter()
        .find(|(prio, _)| prio.code() == code)
        .map(|&(_, acks)| acks)
        .unwrap_or(&[])
}
