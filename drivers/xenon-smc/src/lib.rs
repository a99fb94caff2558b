// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Xenon system management controller (SMC) message interface.
//!
//! The SMC is driven with fixed 16-byte messages whose first byte is the
//! command. Messages go out through a transmit FIFO; replies come back through
//! a receive FIFO and an interrupt, and are parked in a per-command
//! [`ReplyCache`] until the waiting caller picks them up.
//!
//! The transport is a trait, [`SmcTransport`], so the message layer does not
//! care whether it talks to the real FIFO ([`SmcFifo`]) or to a test double.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

mod cache;
mod client;
mod error;
mod fifo;
mod message;

pub use cache::ReplyCache;
pub use client::SmcClient;
pub use error::{SmcError, SmcResult};
pub use fifo::{SmcFifo, WINDOW_SIZE as SMC_WINDOW_SIZE};
pub use message::{NO_REPLY, SMC_MESSAGE_LEN, SmcMessage};

/// Moves messages between the host and the SMC.
pub trait SmcTransport {
    /// Queues `msg` for the controller.
    fn send(&self, msg: &SmcMessage) -> SmcResult;

    /// Blocks until the reply to `msg` has arrived. Returns at once for
    /// commands that expect no reply.
    ///
    /// Fails with [`SmcError::ReplyTimeout`] if the reply does not show up
    /// within the transport's wait bound.
    fn await_reply(&self, msg: &SmcMessage) -> SmcResult;

    /// Pulls a raw reply straight from the receive FIFO into `out`.
    ///
    /// Returns `false` and zeroes `out` if nothing was waiting.
    fn take_reply(&self, out: &mut SmcMessage) -> bool;

    /// Fills the payload of `msg` from the last cached reply to its command.
    fn cached_lookup(&self, msg: &mut SmcMessage) -> bool;
}

impl<T: SmcTransport + ?Sized> SmcTransport for &T {
    fn send(&self, msg: &SmcMessage) -> SmcResult {
        (**self).send(msg)
    }

    fn await_reply(&self, msg: &SmcMessage) -> SmcResult {
        (**self).await_reply(msg)
    }

    fn take_reply(&self, out: &mut SmcMessage) -> bool {
        (**self).take_reply(out)
    }

    fn cached_lookup(&self, msg: &mut SmcMessage) -> bool {
        (**self).cached_lookup(msg)
    }
}

#[cfg(test)]
mod tests;
