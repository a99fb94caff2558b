// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use crate::message::{SMC_MESSAGE_LEN, SmcMessage};

/// Commands whose latest reply is kept.
const CACHED_COMMANDS: [u8; 13] = [
    0x01, // power-on type
    0x04, // rtc
    0x07, // temperatures
    0x0a, // tray state
    0x0f, // av pack
    0x11, // ana
    0x12, // smc version
    0x13, // echo
    0x16, // ir address
    0x17, // tilt state
    0x1e,
    0x20,
    0x83, // smc event
];

/// Last reply payload per known command.
pub struct ReplyCache {
    slots: [[u8; SMC_MESSAGE_LEN - 1]; CACHED_COMMANDS.len()],
}

impl ReplyCache {
    pub const fn new() -> Self {
        Self {
            slots: [[0; SMC_MESSAGE_LEN - 1]; CACHED_COMMANDS.len()],
        }
    }

    fn slot(cmd: u8) -> Option<usize> {
        CACHED_COMMANDS.iter().position(|&c| c == cmd)
    }

    /// Whether replies to `cmd` are kept.
    pub fn is_cached(cmd: u8) -> bool {
        Self::slot(cmd).is_some()
    }

    /// Records `reply` under its command. Replies to unknown commands are
    /// dropped.
    pub fn store(&mut self, reply: &SmcMessage) -> bool {
        match Self::slot(reply.command()) {
            Some(slot) => {
                self.slots[slot].copy_from_slice(reply.payload());
                trace!("smc: cached reply {reply:?}");
                true
            }
            None => {
                warn!("unknown smc reply {:02x}", reply.command());
                false
            }
        }
    }

    /// Copies the cached payload for `msg`'s command into `msg`.
    pub fn lookup(&self, msg: &mut SmcMessage) -> bool {
        match Self::slot(msg.command()) {
            Some(slot) => {
                msg.payload_mut().copy_from_slice(&self.slots[slot]);
                true
            }
            None => false,
        }
    }
}

impl Default for ReplyCache {
    fn default() -> Self {
        Self::new()
    }
}
