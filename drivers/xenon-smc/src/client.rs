// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use crate::{SmcResult, SmcTransport, message::SmcMessage};

const SHOW_LOGO: SmcMessage = SmcMessage::new(&[0x99, 0x01, 0x63]);
const RESTART: SmcMessage = SmcMessage::new(&[0x82, 0x04, 0x30]);
const POWER_OFF: SmcMessage = SmcMessage::new(&[0x82, 0x01, 0x00]);

/// Sends SMC messages over a transport.
pub struct SmcClient<T> {
    transport: T,
}

impl<T: SmcTransport> SmcClient<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `msg` without waiting for an answer.
    pub fn message(&self, msg: &SmcMessage) -> SmcResult {
        self.transport.send(msg)
    }

    /// Sends `msg`, waits for the reply and fills `msg`'s payload from it.
    ///
    /// Returns `Ok(false)` if replies to this command are not kept, in which
    /// case `msg` is left as sent.
    pub fn message_wait(&self, msg: &mut SmcMessage) -> SmcResult<bool> {
        self.transport.send(msg)?;
        self.transport.await_reply(msg)?;
        Ok(self.transport.cached_lookup(msg))
    }

    /// Lights the power ring in the boot pattern.
    pub fn show_logo(&self) -> SmcResult {
        info!("smc: show logo");
        self.message(&SHOW_LOGO)
    }

    pub fn restart(&self) -> SmcResult {
        info!("smc: restart");
        self.message(&RESTART)
    }

    pub fn power_off(&self) -> SmcResult {
        info!("smc: power off");
        self.message(&POWER_OFF)
    }
}
